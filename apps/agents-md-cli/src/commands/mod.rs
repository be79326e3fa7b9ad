pub mod fetch;
pub mod parse;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use agents_md_policy::ParseOutcome;

/// Read a local AGENTS.md as text. Invalid UTF-8 is replaced rather than
/// rejected, matching what the discovery client does with fetched bodies.
pub(crate) fn read_policy_file(path: &Path) -> anyhow::Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
}

/// Human-readable summary of a parse, shared by `parse` and `fetch`.
pub(crate) fn print_outcome(outcome: &ParseOutcome) {
    for error in &outcome.errors {
        println!("error   {}", error);
    }

    if let Some(policy) = outcome.policy() {
        let trust = &policy.trust_requirements;
        println!("site:            {}", policy.identity.site);
        if let Some(contact) = &policy.identity.contact {
            println!("contact:         {}", contact);
        }
        println!(
            "trust level:     {} ({})",
            trust.minimum_trust_level,
            trust.level_name().unwrap_or("unknown")
        );
        println!("authentication:  {}", trust.authentication);

        let allowed: Vec<&str> = policy
            .allowed_actions
            .iter()
            .filter(|(_, allowed)| *allowed)
            .map(|(action, _)| action)
            .collect();
        println!(
            "allowed actions: {}",
            if allowed.is_empty() {
                "-".to_string()
            } else {
                allowed.join(", ")
            }
        );

        let limits = &policy.rate_limits;
        let show = |v: Option<i64>| v.map_or_else(|| "-".to_string(), |n| n.to_string());
        println!(
            "rate limits:     {}/min, {}/hour, {} concurrent",
            show(limits.requests_per_minute),
            show(limits.requests_per_hour),
            show(limits.concurrent_sessions)
        );
    }

    for warning in &outcome.warnings {
        println!("warning {}", warning);
    }
}
