// parse.rs — `agents-md parse <file>`.

use std::path::PathBuf;

use agents_md_policy::parse;
use clap::Args;

#[derive(Args)]
pub struct ParseArgs {
    /// Path to the AGENTS.md file.
    pub file: PathBuf,
    /// Print the full parse outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: &ParseArgs) -> anyhow::Result<()> {
    let content = super::read_policy_file(&args.file)?;
    let outcome = parse(&content);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        super::print_outcome(&outcome);
    }

    if !outcome.success {
        anyhow::bail!("{} is not a usable AGENTS.md file", args.file.display());
    }
    Ok(())
}
