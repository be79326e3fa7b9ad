// policy.rs — The typed AGENTS.md policy model.
//
// Every section except Identity has a documented default, so a policy built
// from nothing but `site` is complete. Optional fields are `None` when the
// operator made no declaration; `None` never means `false` or `0`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoercionError;

/// Lowest trust level on the generic scale.
pub const MIN_TRUST_LEVEL: i64 = 0;

/// Highest trust level on the generic scale.
pub const MAX_TRUST_LEVEL: i64 = 5;

/// Names of the trust levels, indexed by level.
pub const TRUST_LEVEL_NAMES: [&str; 6] = [
    "Anonymous",
    "Identified",
    "Verified",
    "Authorized",
    "Privileged",
    "Administrative",
];

/// Header agents send when `require-agent-header` is set and no name is given.
pub const DEFAULT_AGENT_HEADER: &str = "X-Agent-Identity";

/// Well-known actions and their defaults. Only reading is allowed by default.
pub const WELL_KNOWN_ACTIONS: &[(&str, bool)] = &[
    ("read_content", true),
    ("submit_forms", false),
    ("make_purchases", false),
    ("modify_account", false),
    ("access_api", false),
    ("download_files", false),
    ("upload_files", false),
    ("send_messages", false),
    ("delete_data", false),
    ("create_content", false),
];

/// Human-readable name of a trust level, if it is on the scale.
pub fn trust_level_name(level: i64) -> Option<&'static str> {
    usize::try_from(level)
        .ok()
        .and_then(|idx| TRUST_LEVEL_NAMES.get(idx).copied())
}

/// The complete parsed policy. Only `identity` has no default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Policy {
    pub identity: Identity,

    #[serde(default)]
    pub trust_requirements: TrustRequirements,

    #[serde(default)]
    pub allowed_actions: AllowedActions,

    #[serde(default)]
    pub rate_limits: RateLimits,

    #[serde(default)]
    pub data_handling: DataHandling,

    #[serde(default)]
    pub restrictions: Restrictions,

    #[serde(default)]
    pub agent_identification: AgentIdentification,

    /// `x-` prefixed keys and `x-` sections, keyed by section name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, BTreeMap<String, String>>,
}

impl Policy {
    /// A policy for `identity` with every other section at its default.
    pub fn with_defaults(identity: Identity) -> Self {
        Self {
            identity,
            trust_requirements: TrustRequirements::default(),
            allowed_actions: AllowedActions::default(),
            rate_limits: RateLimits::default(),
            data_handling: DataHandling::default(),
            restrictions: Restrictions::default(),
            agent_identification: AgentIdentification::default(),
            extensions: BTreeMap::new(),
        }
    }

    /// Shorthand for `with_defaults` with only a site.
    pub fn for_site(site: impl Into<String>) -> Self {
        Self::with_defaults(Identity::new(site))
    }
}

/// Identity and contact information for the web property. Required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Domain of the web property, without scheme.
    pub site: String,
    /// Address for AI policy inquiries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// ISO 8601 date (or date-time) of the last policy change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
}

impl Identity {
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            contact: None,
            last_updated: None,
            spec_version: None,
        }
    }
}

/// Minimum trust level and authentication expectations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustRequirements {
    /// 0 (Anonymous) through 5 (Administrative).
    #[serde(default)]
    pub minimum_trust_level: i64,
    #[serde(default)]
    pub authentication: Authentication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_methods: Option<Vec<String>>,
}

impl TrustRequirements {
    /// Name of the declared minimum trust level.
    pub fn level_name(&self) -> Option<&'static str> {
        trust_level_name(self.minimum_trust_level)
    }
}

/// Action name → allowed. Well-known actions carry defaults; operators may
/// declare any other action, which is kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AllowedActions(BTreeMap<String, bool>);

impl Default for AllowedActions {
    fn default() -> Self {
        Self(
            WELL_KNOWN_ACTIONS
                .iter()
                .map(|(name, allowed)| (name.to_string(), *allowed))
                .collect(),
        )
    }
}

impl AllowedActions {
    /// The declared value for an action, if any.
    pub fn get(&self, action: &str) -> Option<bool> {
        self.0.get(&action_key(action)).copied()
    }

    /// Whether an action is allowed. Undeclared actions fall back to their
    /// well-known default, and unknown actions are not allowed.
    pub fn is_allowed(&self, action: &str) -> bool {
        let key = action_key(action);
        self.0
            .get(&key)
            .copied()
            .or_else(|| well_known_default(&key))
            .unwrap_or(false)
    }

    pub fn set(&mut self, action: &str, allowed: bool) {
        self.0.insert(action_key(action), allowed);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalize a directive key (`make-purchases`) to an action key (`make_purchases`).
pub fn action_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace('-', "_")
}

fn well_known_default(key: &str) -> Option<bool> {
    WELL_KNOWN_ACTIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, allowed)| *allowed)
}

/// Rate limits agents are expected to observe.
///
/// `None` means the operator expressed no opinion. `Some(0)` means unlimited.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_hour: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent_sessions: Option<i64>,
}

/// Data handling commitments. Only declared fields are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataHandling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_data_collection: Option<PersonalDataCollection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_retention: Option<DataRetention>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_party_sharing: Option<ThirdPartySharing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdpr_compliance: Option<bool>,
}

/// Path-level restrictions. Patterns are expected to start with `/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Restrictions {
    #[serde(default)]
    pub disallowed_paths: Vec<String>,
    #[serde(default)]
    pub require_human_approval: Vec<String>,
    #[serde(default)]
    pub read_only_paths: Vec<String>,
}

impl Restrictions {
    /// All patterns with the directive they came from.
    pub fn all_paths(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("disallowed-paths", &self.disallowed_paths),
            ("require-human-approval", &self.require_human_approval),
            ("read-only-paths", &self.read_only_paths),
        ]
        .into_iter()
        .flat_map(|(name, list)| list.iter().map(move |path| (name, path.as_str())))
    }
}

/// How agents must identify themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentIdentification {
    #[serde(default)]
    pub require_agent_header: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_header_name: Option<String>,
    #[serde(default)]
    pub require_disclosure: bool,
}

impl AgentIdentification {
    /// The identifying header name, falling back to [`DEFAULT_AGENT_HEADER`].
    pub fn header_name(&self) -> &str {
        self.agent_header_name
            .as_deref()
            .unwrap_or(DEFAULT_AGENT_HEADER)
    }
}

// ── Closed value sets ──

/// A closed set of string-valued variants.
trait ClosedSet: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn expected() -> String {
        Self::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn parse_closed(raw: &str) -> Result<Self, CoercionError> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == normalized)
            .ok_or_else(|| CoercionError::UnknownVariant {
                raw: raw.to_string(),
                expected: Self::expected(),
            })
    }
}

/// Whether agents must authenticate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Authentication {
    Required,
    Optional,
    #[default]
    None,
}

impl ClosedSet for Authentication {
    const ALL: &'static [Self] = &[Self::Required, Self::Optional, Self::None];

    fn as_str(self) -> &'static str {
        match self {
            Authentication::Required => "required",
            Authentication::Optional => "optional",
            Authentication::None => "none",
        }
    }
}

/// Level of personal data collected from agent interactions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PersonalDataCollection {
    None,
    Minimal,
    Standard,
    Extensive,
}

impl ClosedSet for PersonalDataCollection {
    const ALL: &'static [Self] = &[Self::None, Self::Minimal, Self::Standard, Self::Extensive];

    fn as_str(self) -> &'static str {
        match self {
            PersonalDataCollection::None => "none",
            PersonalDataCollection::Minimal => "minimal",
            PersonalDataCollection::Standard => "standard",
            PersonalDataCollection::Extensive => "extensive",
        }
    }
}

/// How long interaction data is retained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DataRetention {
    None,
    SessionOnly,
    #[serde(rename = "30-days")]
    ThirtyDays,
    #[serde(rename = "1-year")]
    OneYear,
    Indefinite,
}

impl ClosedSet for DataRetention {
    const ALL: &'static [Self] = &[
        Self::None,
        Self::SessionOnly,
        Self::ThirtyDays,
        Self::OneYear,
        Self::Indefinite,
    ];

    fn as_str(self) -> &'static str {
        match self {
            DataRetention::None => "none",
            DataRetention::SessionOnly => "session-only",
            DataRetention::ThirtyDays => "30-days",
            DataRetention::OneYear => "1-year",
            DataRetention::Indefinite => "indefinite",
        }
    }
}

/// Whether and how interaction data is shared with third parties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ThirdPartySharing {
    None,
    Anonymized,
    WithConsent,
    Unrestricted,
}

impl ClosedSet for ThirdPartySharing {
    const ALL: &'static [Self] = &[
        Self::None,
        Self::Anonymized,
        Self::WithConsent,
        Self::Unrestricted,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ThirdPartySharing::None => "none",
            ThirdPartySharing::Anonymized => "anonymized",
            ThirdPartySharing::WithConsent => "with-consent",
            ThirdPartySharing::Unrestricted => "unrestricted",
        }
    }
}

macro_rules! impl_text {
    ($($ty:ty),*) => {$(
        impl $ty {
            /// The wire spelling of this value.
            pub fn as_str(self) -> &'static str {
                <Self as ClosedSet>::as_str(self)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(ClosedSet::as_str(*self))
            }
        }

        impl FromStr for $ty {
            type Err = CoercionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_closed(s)
            }
        }
    )*};
}

impl_text!(
    Authentication,
    PersonalDataCollection,
    DataRetention,
    ThirdPartySharing
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_level_names_cover_scale() {
        assert_eq!(trust_level_name(0), Some("Anonymous"));
        assert_eq!(trust_level_name(5), Some("Administrative"));
        assert_eq!(trust_level_name(6), None);
        assert_eq!(trust_level_name(-1), None);
    }

    #[test]
    fn default_actions_allow_only_reading() {
        let actions = AllowedActions::default();
        assert_eq!(actions.len(), WELL_KNOWN_ACTIONS.len());
        assert!(actions.is_allowed("read_content"));
        assert!(actions.is_allowed("read-content"));
        assert!(!actions.is_allowed("make-purchases"));
        assert!(!actions.is_allowed("launch-rockets"));
        assert_eq!(actions.get("launch-rockets"), None);
    }

    #[test]
    fn custom_actions_are_kept() {
        let mut actions = AllowedActions::default();
        actions.set("book-appointments", true);
        assert_eq!(actions.get("book_appointments"), Some(true));
        assert!(actions.iter().any(|(k, v)| k == "book_appointments" && v));
    }

    #[test]
    fn closed_sets_parse_case_insensitively() {
        assert_eq!("Required".parse::<Authentication>(), Ok(Authentication::Required));
        assert_eq!(" 30-days ".parse::<DataRetention>(), Ok(DataRetention::ThirtyDays));
        assert_eq!("with-consent".parse::<ThirdPartySharing>(), Ok(ThirdPartySharing::WithConsent));

        let err = "extreme".parse::<PersonalDataCollection>().unwrap_err();
        assert!(err.to_string().contains("\"extreme\""));
        assert!(err.to_string().contains("none/minimal/standard/extensive"));
    }

    #[test]
    fn closed_sets_serialize_with_wire_spelling() {
        assert_eq!(serde_json::to_string(&DataRetention::OneYear).unwrap(), "\"1-year\"");
        assert_eq!(serde_json::to_string(&DataRetention::SessionOnly).unwrap(), "\"session-only\"");
        assert_eq!(DataRetention::ThirtyDays.to_string(), "30-days");
    }

    #[test]
    fn header_name_falls_back_to_default() {
        let mut ident = AgentIdentification::default();
        assert_eq!(ident.header_name(), DEFAULT_AGENT_HEADER);
        ident.agent_header_name = Some("X-AI-Bot".into());
        assert_eq!(ident.header_name(), "X-AI-Bot");
    }

    #[test]
    fn policy_round_trips_through_json() {
        let mut policy = Policy::for_site("example.com");
        policy.rate_limits.requests_per_minute = Some(0);
        policy.data_handling.data_retention = Some(DataRetention::ThirtyDays);

        let json = serde_json::to_string(&policy).unwrap();
        let back: Policy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn sparse_json_fills_defaults() {
        let policy: Policy = serde_json::from_str(r#"{"identity":{"site":"example.com"}}"#).unwrap();
        assert_eq!(policy, Policy::for_site("example.com"));
    }
}
