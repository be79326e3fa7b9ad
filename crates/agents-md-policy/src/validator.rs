// validator.rs — Semantic re-validation of an already-built Policy.
//
// Independent of how the policy was produced: it may come straight from
// `parse`, or be deserialized from JSON written by some other tool. Enumerated
// fields (authentication, data handling levels) are closed Rust enums, so
// membership is guaranteed once a Policy exists; the remaining invariants are
// checked here.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::outcome::ValidationOutcome;
use crate::policy::{Policy, MAX_TRUST_LEVEL, MIN_TRUST_LEVEL};

/// Validate a policy and collect every violation as a human-readable string.
pub fn validate(policy: &Policy) -> ValidationOutcome {
    let mut errors = Vec::new();

    // Identity.
    let site = policy.identity.site.as_str();
    if site.trim().is_empty() {
        errors.push("identity.site is required and must not be empty".to_string());
    } else {
        if site.contains("://") {
            errors.push(format!(
                "identity.site \"{site}\" must be a domain name only, without a scheme (e.g. \"example.com\")"
            ));
        }
        if site.chars().any(char::is_whitespace) {
            errors.push(format!("identity.site \"{site}\" must not contain whitespace"));
        }
    }

    if let Some(updated) = &policy.identity.last_updated {
        if !is_iso8601(updated) {
            errors.push(format!(
                "identity.last_updated \"{updated}\" is not a valid ISO 8601 date"
            ));
        }
    }

    // Trust requirements.
    let level = policy.trust_requirements.minimum_trust_level;
    if !(MIN_TRUST_LEVEL..=MAX_TRUST_LEVEL).contains(&level) {
        errors.push(format!(
            "trust_requirements.minimum_trust_level must be an integer between {MIN_TRUST_LEVEL} and {MAX_TRUST_LEVEL}, got {level}"
        ));
    }

    if let Some(methods) = &policy.trust_requirements.authentication_methods {
        if methods.iter().any(|m| m.trim().is_empty()) {
            errors.push(
                "trust_requirements.authentication_methods must contain non-empty strings"
                    .to_string(),
            );
        }
    }

    // Rate limits.
    let limits = &policy.rate_limits;
    for (field, value) in [
        ("requests_per_minute", limits.requests_per_minute),
        ("requests_per_hour", limits.requests_per_hour),
        ("concurrent_sessions", limits.concurrent_sessions),
    ] {
        if let Some(value) = value.filter(|v| *v < 0) {
            errors.push(format!(
                "rate_limits.{field} must be a non-negative integer, got {value}"
            ));
        }
    }

    // Restrictions.
    for (directive, path) in policy.restrictions.all_paths() {
        if !path.starts_with('/') {
            errors.push(format!(
                "restrictions.{} path \"{path}\" must start with \"/\"",
                directive.replace('-', "_")
            ));
        }
    }

    // Agent identification.
    if let Some(name) = &policy.agent_identification.agent_header_name {
        if name.trim().is_empty() {
            errors.push(
                "agent_identification.agent_header_name must be a non-empty string if specified"
                    .to_string(),
            );
        }
    }

    ValidationOutcome::from_errors(errors)
}

/// `YYYY-MM-DD`, optionally followed by `THH:MM:SS[.fff][Z|±HH:MM]`.
fn is_iso8601(value: &str) -> bool {
    let bytes = value.as_bytes();
    let date_shape = bytes.len() >= 10
        && bytes[..10]
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
    if !date_shape {
        return false;
    }

    if bytes.len() == 10 {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    }
    if bytes[10] != b'T' {
        return false;
    }

    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}
