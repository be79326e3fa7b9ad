//! # agents-md-cli
//!
//! Command-line front end for the AGENTS.md engine:
//! - `agents-md parse <file>` — parse a local file and report warnings
//! - `agents-md validate <file>` — parse, then re-check the resulting policy
//! - `agents-md fetch <origin>` — discover and parse a site's published policy

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Parse, validate and discover AGENTS.md agent-interaction policies.
#[derive(Parser)]
#[command(name = "agents-md", version, about)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a local AGENTS.md file.
    Parse(commands::parse::ParseArgs),
    /// Parse and validate a local AGENTS.md file.
    Validate(commands::validate::ValidateArgs),
    /// Discover and parse the policy published by an origin.
    Fetch(commands::fetch::FetchArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs)?;

    match &cli.command {
        Commands::Parse(args) => commands::parse::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Fetch(args) => commands::fetch::execute(args),
    }
}

fn init_logging(json: bool) -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    let filter = EnvFilter::from_default_env()
        .add_directive("agents_md_policy=warn".parse()?)
        .add_directive("agents_md_discovery=info".parse()?)
        .add_directive("agents_md=info".parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
