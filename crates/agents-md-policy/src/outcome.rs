// outcome.rs — Caller-facing results of parsing and validation.
//
// These are the only types downstream tools (CLI, editor integration,
// registry verification) should depend on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::policy::Policy;

/// A fault that prevents producing any policy at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructuralError {
    /// Section the error refers to (always "identity" today).
    pub section: String,
    pub message: String,
    /// 1-based source line, when one can be pointed at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", self.section, line, self.message),
            None => write!(f, "[{}] {}", self.section, self.message),
        }
    }
}

/// A recoverable fault in one field, resolved via the field's default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldWarning {
    /// Normalized section name (e.g. "rate limits").
    pub section: String,
    /// Directive key the warning refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.section)?;
        if let Some(line) = self.line {
            write!(f, " line {}", line)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// The result of parsing an AGENTS.md file.
///
/// `success == false` guarantees `policy` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
    #[serde(default)]
    pub errors: Vec<StructuralError>,
    #[serde(default)]
    pub warnings: Vec<FieldWarning>,
}

impl ParseOutcome {
    /// A usable policy, possibly with warnings.
    pub fn parsed(policy: Policy, warnings: Vec<FieldWarning>) -> Self {
        Self {
            success: true,
            policy: Some(policy),
            errors: Vec::new(),
            warnings,
        }
    }

    /// No policy could be produced.
    pub fn failed(error: StructuralError) -> Self {
        Self {
            success: false,
            policy: None,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    pub fn policy(&self) -> Option<&Policy> {
        self.policy.as_ref()
    }

    pub fn into_policy(self) -> Option<Policy> {
        self.policy
    }
}

/// The result of re-validating an already-built [`Policy`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}
