// parser.rs — Policy assembly: extracted sections → typed Policy + warnings.
//
// Each known section follows one rule:
//
// 1. Section absent → documented default, verbatim.
// 2. Section present → read each recognized key through the coercers; a key
//    that is absent or fails coercion keeps the section default, and every
//    failure appends a FieldWarning.
//
// Identity is the exception. No Identity section, or an empty `site`, stops
// assembly with a StructuralError. That is the only fatal condition in a parse.

use std::collections::BTreeMap;

use crate::coerce::{to_boolean, to_integer, to_string_array};
use crate::error::CoercionError;
use crate::extract::{extract, Directive, RawSection};
use crate::outcome::{FieldWarning, ParseOutcome, StructuralError};
use crate::policy::{
    AgentIdentification, AllowedActions, Authentication, DataHandling, DataRetention, Identity,
    PersonalDataCollection, Policy, RateLimits, Restrictions, ThirdPartySharing,
    TrustRequirements, MAX_TRUST_LEVEL, MIN_TRUST_LEVEL,
};

pub const IDENTITY: &str = "identity";
pub const TRUST_REQUIREMENTS: &str = "trust requirements";
pub const ALLOWED_ACTIONS: &str = "allowed actions";
pub const RATE_LIMITS: &str = "rate limits";
pub const DATA_HANDLING: &str = "data handling";
pub const RESTRICTIONS: &str = "restrictions";
pub const AGENT_IDENTIFICATION: &str = "agent identification";

/// Normalized names of every section the assembler understands.
pub const KNOWN_SECTIONS: &[&str] = &[
    IDENTITY,
    TRUST_REQUIREMENTS,
    ALLOWED_ACTIONS,
    RATE_LIMITS,
    DATA_HANDLING,
    RESTRICTIONS,
    AGENT_IDENTIFICATION,
];

/// Keys and sections with this prefix are operator extensions.
pub const EXTENSION_PREFIX: &str = "x-";

const IDENTITY_KEYS: &[&str] = &["site", "contact", "last-updated", "spec-version"];
const TRUST_KEYS: &[&str] = &[
    "minimum-trust-level",
    "authentication",
    "authentication-methods",
];
const RATE_LIMIT_KEYS: &[&str] = &[
    "requests-per-minute",
    "requests-per-hour",
    "concurrent-sessions",
];
const DATA_HANDLING_KEYS: &[&str] = &[
    "personal-data-collection",
    "data-retention",
    "third-party-sharing",
    "gdpr-compliance",
];
const RESTRICTION_KEYS: &[&str] = &[
    "disallowed-paths",
    "require-human-approval",
    "read-only-paths",
];
const AGENT_IDENTIFICATION_KEYS: &[&str] = &[
    "require-agent-header",
    "agent-header-name",
    "require-disclosure",
];

/// Parse the raw content of an AGENTS.md file.
///
/// Never panics and never fails on malformed lines; see [`ParseOutcome`].
pub fn parse(content: &str) -> ParseOutcome {
    let sections = extract(content);

    let Some(identity_section) = sections.get(IDENTITY) else {
        tracing::debug!(sections = sections.len(), "no identity section");
        return ParseOutcome::failed(StructuralError {
            section: IDENTITY.to_string(),
            message: "missing required ## Identity section".to_string(),
            line: None,
        });
    };

    let site = identity_section
        .get("site")
        .map(|d| d.value.trim())
        .unwrap_or_default();
    if site.is_empty() {
        return ParseOutcome::failed(StructuralError {
            section: IDENTITY.to_string(),
            message: "the Identity section is missing the required \"site\" key".to_string(),
            line: Some(identity_section.line),
        });
    }

    let mut asm = Assembler::default();
    let identity = asm.identity(identity_section, site);
    let trust_requirements = asm.trust_requirements(sections.get(TRUST_REQUIREMENTS));
    let allowed_actions = asm.allowed_actions(sections.get(ALLOWED_ACTIONS));
    let rate_limits = asm.rate_limits(sections.get(RATE_LIMITS));
    let data_handling = asm.data_handling(sections.get(DATA_HANDLING));
    let restrictions = asm.restrictions(sections.get(RESTRICTIONS));
    let agent_identification = asm.agent_identification(sections.get(AGENT_IDENTIFICATION));

    for section in sections.iter() {
        if KNOWN_SECTIONS.contains(&section.name.as_str()) {
            continue;
        }
        if section.name.starts_with(EXTENSION_PREFIX) {
            for directive in section.entries() {
                asm.keep_extension(&section.name, directive);
            }
        } else {
            tracing::debug!(section = %section.name, "ignoring unknown section");
        }
    }

    tracing::debug!(
        site = %identity.site,
        warnings = asm.warnings.len(),
        "assembled policy"
    );

    let policy = Policy {
        identity,
        trust_requirements,
        allowed_actions,
        rate_limits,
        data_handling,
        restrictions,
        agent_identification,
        extensions: asm.extensions,
    };
    ParseOutcome::parsed(policy, asm.warnings)
}

/// Accumulates warnings and extensions for one parse call.
#[derive(Default)]
struct Assembler {
    warnings: Vec<FieldWarning>,
    extensions: BTreeMap<String, BTreeMap<String, String>>,
}

impl Assembler {
    fn warn(&mut self, section: &str, directive: &Directive, message: String) {
        self.warnings.push(FieldWarning {
            section: section.to_string(),
            key: Some(directive.key.clone()),
            message,
            line: Some(directive.line),
        });
    }

    /// Unwrap a coercion result, turning a failure into a warning.
    fn accept<T>(
        &mut self,
        section: &str,
        directive: &Directive,
        result: Result<T, CoercionError>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.warn(section, directive, format!("{}: {}", directive.key, err));
                None
            }
        }
    }

    fn keep_extension(&mut self, section: &str, directive: &Directive) {
        self.extensions
            .entry(section.to_string())
            .or_default()
            .insert(directive.key.clone(), directive.value.clone());
    }

    /// Warn about (and drop) keys the section does not define. `x-` keys are
    /// kept as extensions.
    fn check_keys(&mut self, section: &RawSection, known: &[&str]) {
        for directive in section.entries() {
            if known.contains(&directive.key.as_str()) {
                continue;
            }
            if directive.key.starts_with(EXTENSION_PREFIX) {
                self.keep_extension(&section.name, directive);
            } else {
                tracing::debug!(
                    section = %section.name,
                    key = %directive.key,
                    line = directive.line,
                    "dropping unrecognized key"
                );
                self.warn(
                    &section.name,
                    directive,
                    format!("unrecognized key \"{}\"; ignored", directive.key),
                );
            }
        }
    }

    fn identity(&mut self, section: &RawSection, site: &str) -> Identity {
        self.check_keys(section, IDENTITY_KEYS);

        let optional = |key: &str| {
            section
                .get(key)
                .map(|d| d.value.clone())
                .filter(|v| !v.is_empty())
        };

        Identity {
            site: site.to_string(),
            contact: optional("contact"),
            last_updated: optional("last-updated"),
            spec_version: optional("spec-version"),
        }
    }

    fn trust_requirements(&mut self, section: Option<&RawSection>) -> TrustRequirements {
        let mut result = TrustRequirements::default();
        let Some(section) = section else {
            return result;
        };
        self.check_keys(section, TRUST_KEYS);

        if let Some(d) = section.get("minimum-trust-level") {
            if let Some(level) = self.accept(TRUST_REQUIREMENTS, d, to_integer(&d.value)) {
                let clamped = level.clamp(MIN_TRUST_LEVEL, MAX_TRUST_LEVEL);
                if clamped != level {
                    self.warn(
                        TRUST_REQUIREMENTS,
                        d,
                        format!(
                            "{}: trust level {} is outside the valid {}-{} range; clamped to {}",
                            d.key, level, MIN_TRUST_LEVEL, MAX_TRUST_LEVEL, clamped
                        ),
                    );
                }
                result.minimum_trust_level = clamped;
            }
        }

        if let Some(d) = section.get("authentication") {
            let parsed = d.value.parse::<Authentication>();
            if let Some(mode) = self.accept(TRUST_REQUIREMENTS, d, parsed) {
                result.authentication = mode;
            }
        }

        if let Some(d) = section.get("authentication-methods") {
            result.authentication_methods = Some(to_string_array(&d.value));
        }

        result
    }

    /// Every key is an action here; unknown actions are kept, not warned about.
    fn allowed_actions(&mut self, section: Option<&RawSection>) -> AllowedActions {
        let mut result = AllowedActions::default();
        let Some(section) = section else {
            return result;
        };

        for d in section.entries() {
            if let Some(allowed) = self.accept(ALLOWED_ACTIONS, d, to_boolean(&d.value)) {
                result.set(&d.key, allowed);
            }
        }

        result
    }

    /// Values that fail to parse are omitted, never defaulted to 0.
    fn rate_limits(&mut self, section: Option<&RawSection>) -> RateLimits {
        let mut result = RateLimits::default();
        let Some(section) = section else {
            return result;
        };
        self.check_keys(section, RATE_LIMIT_KEYS);

        let mut read = |key: &str| -> Option<i64> {
            let d = section.get(key)?;
            let value = self.accept(RATE_LIMITS, d, to_integer(&d.value))?;
            if value < 0 {
                self.warn(
                    RATE_LIMITS,
                    d,
                    format!(
                        "{}: {} is negative; expected a non-negative integer (0 means unlimited)",
                        d.key, value
                    ),
                );
                return None;
            }
            Some(value)
        };

        result.requests_per_minute = read("requests-per-minute");
        result.requests_per_hour = read("requests-per-hour");
        result.concurrent_sessions = read("concurrent-sessions");
        result
    }

    fn data_handling(&mut self, section: Option<&RawSection>) -> DataHandling {
        let mut result = DataHandling::default();
        let Some(section) = section else {
            return result;
        };
        self.check_keys(section, DATA_HANDLING_KEYS);

        if let Some(d) = section.get("personal-data-collection") {
            result.personal_data_collection =
                self.accept(DATA_HANDLING, d, d.value.parse::<PersonalDataCollection>());
        }
        if let Some(d) = section.get("data-retention") {
            result.data_retention =
                self.accept(DATA_HANDLING, d, d.value.parse::<DataRetention>());
        }
        if let Some(d) = section.get("third-party-sharing") {
            result.third_party_sharing =
                self.accept(DATA_HANDLING, d, d.value.parse::<ThirdPartySharing>());
        }
        if let Some(d) = section.get("gdpr-compliance") {
            result.gdpr_compliance = self.accept(DATA_HANDLING, d, to_boolean(&d.value));
        }

        result
    }

    /// Paths without a leading `/` are kept but warned about.
    fn restrictions(&mut self, section: Option<&RawSection>) -> Restrictions {
        let Some(section) = section else {
            return Restrictions::default();
        };
        self.check_keys(section, RESTRICTION_KEYS);

        let mut paths = |key: &str| -> Vec<String> {
            let Some(d) = section.get(key) else {
                return Vec::new();
            };
            let list = to_string_array(&d.value);
            for path in list.iter().filter(|p| !p.starts_with('/')) {
                self.warn(
                    RESTRICTIONS,
                    d,
                    format!(
                        "{}: path pattern \"{}\" does not start with \"/\"; path patterns should be absolute",
                        d.key, path
                    ),
                );
            }
            list
        };

        Restrictions {
            disallowed_paths: paths("disallowed-paths"),
            require_human_approval: paths("require-human-approval"),
            read_only_paths: paths("read-only-paths"),
        }
    }

    fn agent_identification(&mut self, section: Option<&RawSection>) -> AgentIdentification {
        let mut result = AgentIdentification::default();
        let Some(section) = section else {
            return result;
        };
        self.check_keys(section, AGENT_IDENTIFICATION_KEYS);

        if let Some(d) = section.get("require-agent-header") {
            if let Some(required) = self.accept(AGENT_IDENTIFICATION, d, to_boolean(&d.value)) {
                result.require_agent_header = required;
            }
        }
        if let Some(d) = section.get("agent-header-name") {
            if !d.value.is_empty() {
                result.agent_header_name = Some(d.value.clone());
            }
        }
        if let Some(d) = section.get("require-disclosure") {
            if let Some(required) = self.accept(AGENT_IDENTIFICATION, d, to_boolean(&d.value)) {
                result.require_disclosure = required;
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "# AGENTS.md\n\n## Identity\n- site: example.com\n";

    fn with_minimal(extra: &str) -> ParseOutcome {
        parse(&format!("{MINIMAL}\n{extra}"))
    }

    fn warnings_for<'a>(outcome: &'a ParseOutcome, section: &str) -> Vec<&'a FieldWarning> {
        outcome
            .warnings
            .iter()
            .filter(|w| w.section == section)
            .collect()
    }

    #[test]
    fn minimal_file_gets_every_default() {
        let outcome = parse(MINIMAL);
        assert!(outcome.success);
        assert!(outcome.errors.is_empty());
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.policy.unwrap(), Policy::for_site("example.com"));
    }

    #[test]
    fn missing_identity_section_is_fatal() {
        let outcome = parse("# AGENTS.md\n\n## Rate Limits\n- requests-per-minute: 10\n");
        assert!(!outcome.success);
        assert!(outcome.policy.is_none());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].section, "identity");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn empty_and_whitespace_input_is_fatal() {
        for content in ["", "   \n\t\n"] {
            let outcome = parse(content);
            assert!(!outcome.success);
            assert_eq!(outcome.errors[0].section, "identity");
        }
    }

    #[test]
    fn identity_without_site_is_fatal() {
        let outcome = parse("## Identity\n- contact: a@b.com\n");
        assert!(!outcome.success);
        assert!(outcome.policy.is_none());
        assert_eq!(outcome.errors[0].line, Some(1));

        let outcome = parse("## Identity\n- site:    \n");
        assert!(!outcome.success);
    }

    #[test]
    fn fatal_error_stops_before_other_warnings() {
        let outcome = parse("## Identity\n- bogus: 1\n## Rate Limits\n- requests-per-minute: fast\n");
        assert!(!outcome.success);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn parses_identity_fields() {
        let outcome = parse(
            "## Identity\n- site:   example.com  \n- contact: ai@example.com\n- last-updated: 2026-03-15\n- spec-version: 1.0.0\n",
        );
        let identity = outcome.policy.unwrap().identity;
        assert_eq!(identity.site, "example.com");
        assert_eq!(identity.contact.as_deref(), Some("ai@example.com"));
        assert_eq!(identity.last_updated.as_deref(), Some("2026-03-15"));
        assert_eq!(identity.spec_version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn unknown_keys_warn_and_extension_keys_are_kept() {
        let outcome = parse("## Identity\n- site: example.com\n- unknown-key: 1\n- x-custom-key: hello\n");
        assert!(outcome.success);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].message.contains("unknown-key"));
        assert_eq!(outcome.warnings[0].line, Some(3));

        let policy = outcome.policy.unwrap();
        assert_eq!(policy.extensions["identity"]["x-custom-key"], "hello");
    }

    #[test]
    fn extension_sections_are_preserved_and_unknown_sections_ignored() {
        let outcome = with_minimal("## X-Partner Program\n- tier: gold\n\n## Changelog\n- 2026: launched\n");
        assert!(outcome.warnings.is_empty());
        let policy = outcome.policy.unwrap();
        assert_eq!(policy.extensions["x-partner program"]["tier"], "gold");
        assert!(!policy.extensions.contains_key("changelog"));
    }

    #[test]
    fn parses_trust_requirements() {
        let outcome = with_minimal(
            "## Trust Requirements\n- minimum-trust-level: 3\n- authentication: Required\n- authentication-methods: oauth2, api-key, bearer\n",
        );
        assert!(outcome.warnings.is_empty());
        let trust = outcome.policy.unwrap().trust_requirements;
        assert_eq!(trust.minimum_trust_level, 3);
        assert_eq!(trust.level_name(), Some("Authorized"));
        assert_eq!(trust.authentication, Authentication::Required);
        assert_eq!(
            trust.authentication_methods,
            Some(vec!["oauth2".to_string(), "api-key".into(), "bearer".into()])
        );
    }

    #[test]
    fn trust_level_out_of_range_is_clamped_with_warning() {
        let outcome = with_minimal("## Trust Requirements\n- minimum-trust-level: 7\n");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].message.contains("outside the valid 0-5 range"));
        assert_eq!(outcome.policy.unwrap().trust_requirements.minimum_trust_level, 5);

        let outcome = with_minimal("## Trust Requirements\n- minimum-trust-level: -2\n");
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.policy.unwrap().trust_requirements.minimum_trust_level, 0);
    }

    #[test]
    fn non_integer_trust_level_keeps_default() {
        let outcome = with_minimal("## Trust Requirements\n- minimum-trust-level: high\n- authentication: sometimes\n");
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.warnings.iter().any(|w| w.message.contains("\"high\"")));
        assert!(outcome.warnings.iter().any(|w| w.message.contains("authentication")));
        let trust = outcome.policy.unwrap().trust_requirements;
        assert_eq!(trust.minimum_trust_level, 0);
        assert_eq!(trust.authentication, Authentication::None);
    }

    #[test]
    fn parses_allowed_actions_with_custom_keys() {
        let outcome = with_minimal(
            "## Allowed Actions\n- read-content: yes\n- submit-forms: off\n- make-purchases: 1\n- send-messages: true\n- book-appointments: on\n",
        );
        assert!(outcome.warnings.is_empty());
        let actions = outcome.policy.unwrap().allowed_actions;
        assert_eq!(actions.get("read_content"), Some(true));
        assert_eq!(actions.get("submit_forms"), Some(false));
        assert_eq!(actions.get("make_purchases"), Some(true));
        assert_eq!(actions.get("send_messages"), Some(true));
        assert_eq!(actions.get("book_appointments"), Some(true));
        assert_eq!(actions.get("delete_data"), Some(false));
    }

    #[test]
    fn bad_action_value_keeps_section_default() {
        let outcome = with_minimal("## Allowed Actions\n- make-purchases: maybe\n- read-content: perhaps\n- custom-thing: dunno\n");
        assert_eq!(warnings_for(&outcome, "allowed actions").len(), 3);
        assert!(outcome.warnings[0].message.contains("\"maybe\""));
        let actions = outcome.policy.unwrap().allowed_actions;
        assert_eq!(actions.get("make_purchases"), Some(false));
        // read-content defaults to true, not false.
        assert_eq!(actions.get("read_content"), Some(true));
        assert_eq!(actions.get("custom_thing"), None);
    }

    #[test]
    fn parses_rate_limits_including_unlimited() {
        let outcome = with_minimal("## Rate Limits\n- requests-per-minute: 30\n- requests-per-hour: 0\n");
        let limits = outcome.policy.unwrap().rate_limits;
        assert_eq!(limits.requests_per_minute, Some(30));
        assert_eq!(limits.requests_per_hour, Some(0));
        assert_eq!(limits.concurrent_sessions, None);
    }

    #[test]
    fn bad_rate_limit_is_omitted_not_zeroed() {
        let outcome = with_minimal("## Rate Limits\n- requests-per-minute: fast\n- requests-per-hour: 010\n- concurrent-sessions: -1\n");
        assert_eq!(warnings_for(&outcome, "rate limits").len(), 3);
        assert!(outcome.warnings[0].message.contains("\"fast\""));
        assert_eq!(outcome.policy.unwrap().rate_limits, RateLimits::default());
    }

    #[test]
    fn parses_data_handling() {
        let outcome = with_minimal(
            "## Data Handling\n- personal-data-collection: minimal\n- data-retention: session-only\n- third-party-sharing: none\n- gdpr-compliance: yes\n",
        );
        assert!(outcome.warnings.is_empty());
        let data = outcome.policy.unwrap().data_handling;
        assert_eq!(data.personal_data_collection, Some(PersonalDataCollection::Minimal));
        assert_eq!(data.data_retention, Some(DataRetention::SessionOnly));
        assert_eq!(data.third_party_sharing, Some(ThirdPartySharing::None));
        assert_eq!(data.gdpr_compliance, Some(true));
    }

    #[test]
    fn bad_enum_value_leaves_field_absent() {
        let outcome = with_minimal("## Data Handling\n- personal-data-collection: extreme\n- data-retention: forever\n");
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.warnings[0].message.contains("\"extreme\""));
        let data = outcome.policy.unwrap().data_handling;
        assert_eq!(data.personal_data_collection, None);
        assert_eq!(data.data_retention, None);
    }

    #[test]
    fn parses_restriction_lists() {
        let outcome = with_minimal(
            "## Restrictions\n- disallowed-paths: /admin/*, /internal/*\n- require-human-approval: /checkout/*, /account/delete\n- read-only-paths: /blog/*, /docs/**\n",
        );
        assert!(outcome.warnings.is_empty());
        let r = outcome.policy.unwrap().restrictions;
        assert_eq!(r.disallowed_paths, vec!["/admin/*", "/internal/*"]);
        assert_eq!(r.require_human_approval, vec!["/checkout/*", "/account/delete"]);
        assert_eq!(r.read_only_paths, vec!["/blog/*", "/docs/**"]);
    }

    #[test]
    fn relative_paths_warn_under_restrictions() {
        let outcome = with_minimal("## Restrictions\n- disallowed-paths: admin/*, internal\n");
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.warnings.iter().all(|w| w.section == "restrictions"));
        let r = outcome.policy.unwrap().restrictions;
        assert_eq!(r.disallowed_paths, vec!["admin/*", "internal"]);
        assert!(r.disallowed_paths.iter().all(|p| !p.starts_with('/')));
    }

    #[test]
    fn parses_agent_identification() {
        let outcome = with_minimal(
            "## Agent Identification\n- require-agent-header: true\n- agent-header-name: X-AI-Bot\n- require-disclosure: yes\n",
        );
        let ident = outcome.policy.unwrap().agent_identification;
        assert!(ident.require_agent_header);
        assert_eq!(ident.header_name(), "X-AI-Bot");
        assert!(ident.require_disclosure);
    }

    #[test]
    fn bad_agent_identification_boolean_keeps_default() {
        let outcome = with_minimal("## Agent Identification\n- require-disclosure: sure\n");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(!outcome.policy.unwrap().agent_identification.require_disclosure);
    }

    #[test]
    fn last_duplicate_directive_wins() {
        let outcome = with_minimal("## Rate Limits\n- requests-per-minute: 10\n- requests-per-minute: 20\n");
        assert_eq!(outcome.policy.unwrap().rate_limits.requests_per_minute, Some(20));
    }

    #[test]
    fn dropped_keys_are_debug_logged() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let outcome = tracing::subscriber::with_default(subscriber, || {
            with_minimal("## Rate Limits\n- burst-size: 40\n")
        });
        assert_eq!(warnings_for(&outcome, RATE_LIMITS).len(), 1);

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("dropping unrecognized key"), "{logs}");
        assert!(logs.contains("burst-size"), "{logs}");
    }
}
