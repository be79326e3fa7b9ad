//! # agents-md-policy
//!
//! Parsing and validation engine for AGENTS.md files, the policy a web
//! property publishes to declare how autonomous agents may interact with it.
//!
//! The pipeline is `text → extract → assemble → ParseOutcome`, with
//! [`validate`] available to re-check any [`Policy`] afterwards, however it
//! was produced.
//!
//! ## Key invariants
//!
//! - **One fatal condition**: a missing `## Identity` section or an empty
//!   `site` directive. Everything else degrades to documented defaults.
//! - **Warnings, not failures**: malformed values produce a [`FieldWarning`]
//!   and fall back to the section default for that field.
//! - **Absent is not zero**: rate limits that fail to parse are omitted,
//!   because `0` means "unlimited".
//! - **Advisory only**: nothing here enforces the policy.

pub mod coerce;
pub mod error;
pub mod extract;
pub mod outcome;
pub mod parser;
pub mod policy;
pub mod validator;

pub use error::CoercionError;
pub use outcome::{FieldWarning, ParseOutcome, StructuralError, ValidationOutcome};
pub use parser::parse;
pub use policy::{
    trust_level_name, AgentIdentification, AllowedActions, Authentication, DataHandling,
    DataRetention, Identity, PersonalDataCollection, Policy, RateLimits, Restrictions,
    ThirdPartySharing, TrustRequirements,
};
pub use validator::validate;
