// validate.rs — `agents-md validate <file>`: parse, then re-check the policy.

use std::path::PathBuf;

use agents_md_policy::{parse, validate};
use clap::Args;

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the AGENTS.md file.
    pub file: PathBuf,
    /// Print parse and validation results as JSON.
    #[arg(long)]
    pub json: bool,
    /// Treat parse warnings as failures.
    #[arg(long)]
    pub strict: bool,
}

pub fn execute(args: &ValidateArgs) -> anyhow::Result<()> {
    let content = super::read_policy_file(&args.file)?;
    let outcome = parse(&content);
    let validation = outcome.policy().map(validate);

    if args.json {
        let report = serde_json::json!({
            "parse": &outcome,
            "validation": &validation,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for error in &outcome.errors {
            println!("error   {}", error);
        }
        for warning in &outcome.warnings {
            println!("warning {}", warning);
        }
        if let Some(validation) = &validation {
            for error in &validation.errors {
                println!("invalid {}", error);
            }
        }
    }

    let Some(validation) = validation else {
        anyhow::bail!("{} could not be parsed", args.file.display());
    };
    if !validation.valid {
        anyhow::bail!(
            "{} failed validation with {} error(s)",
            args.file.display(),
            validation.errors.len()
        );
    }
    if args.strict && !outcome.warnings.is_empty() {
        anyhow::bail!(
            "{} has {} warning(s) (--strict)",
            args.file.display(),
            outcome.warnings.len()
        );
    }

    if !args.json {
        println!("{} is valid", args.file.display());
    }
    Ok(())
}
