// fetch.rs — `agents-md fetch <origin>`: run discovery against a live site.

use std::path::PathBuf;

use agents_md_discovery::{AttemptStatus, Discovery, DiscoveryClient, DiscoveryConfig};
use clap::Args;

#[derive(Args)]
pub struct FetchArgs {
    /// Origin to discover, e.g. https://example.com
    pub origin: String,
    /// Discovery config file (defaults to <config dir>/agents-md/discovery.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Allow plain-HTTP origins and redirects. Local testing only.
    #[arg(long)]
    pub allow_http: bool,
    /// Per-attempt timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Print the discovery trace and parse outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: &FetchArgs) -> anyhow::Result<()> {
    let config = resolve_config(args)?;
    let rt = tokio::runtime::Runtime::new()?;
    let discovery = rt.block_on(async {
        let client = DiscoveryClient::new(config)?;
        client.discover(&args.origin).await
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report(&discovery))?);
    } else {
        print_discovery(&discovery);
    }

    match &discovery.policy {
        Some(found) if !found.outcome.success => {
            anyhow::bail!("policy at {} could not be parsed", found.url)
        }
        _ => Ok(()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("agents-md").join("discovery.toml"))
}

/// File values first, then command-line overrides. An explicit `--config`
/// must load; the default location is optional.
fn resolve_config(args: &FetchArgs) -> anyhow::Result<DiscoveryConfig> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading discovery config");
            DiscoveryConfig::load(path)?
        }
        None => match default_config_path() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using default discovery config location");
                DiscoveryConfig::load_or_default(&path)
            }
            None => DiscoveryConfig::default(),
        },
    };
    if args.allow_http {
        tracing::warn!("HTTPS enforcement disabled by --allow-http");
        config.enforce_https = false;
    }
    if let Some(secs) = args.timeout {
        config.timeout_secs = secs;
    }
    tracing::debug!(
        enforce_https = config.enforce_https,
        timeout_secs = config.timeout_secs,
        max_body_bytes = config.max_body_bytes,
        "resolved discovery config"
    );
    Ok(config)
}

fn report(discovery: &Discovery) -> serde_json::Value {
    let found = discovery.policy.as_ref();
    serde_json::json!({
        "origin": discovery.origin.as_str(),
        "attempts": &discovery.attempts,
        "found": discovery.found(),
        "policy_url": found.map(|p| p.url.as_str()),
        "max_age_secs": found.and_then(|p| p.max_age).map(|d| d.as_secs()),
        "outcome": found.map(|p| &p.outcome),
    })
}

fn print_discovery(discovery: &Discovery) {
    for attempt in &discovery.attempts {
        let status = match &attempt.status {
            AttemptStatus::Found => "found".to_string(),
            AttemptStatus::NotFound { status } => format!("not found (HTTP {status})"),
            AttemptStatus::Downgraded { final_url } => {
                format!("abandoned: redirected to insecure {final_url}")
            }
            AttemptStatus::TooLarge { bytes } => format!("rejected: {bytes} bytes"),
            AttemptStatus::TimedOut => "timed out".to_string(),
        };
        println!("{:<48} {}", attempt.url, status);
    }
    println!();

    match &discovery.policy {
        Some(found) => super::print_outcome(&found.outcome),
        None => println!(
            "No AGENTS.md published by {}; permissive defaults apply.",
            discovery.origin
        ),
    }
}
