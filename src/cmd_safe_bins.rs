// `safe-bins` subcommands — manage the set of inherently low-risk binaries.

use std::path::Path;

use clap::Subcommand;
use miette::IntoDiagnostic;

use go_ahead::engine::ApprovalEngine;

#[derive(Subcommand)]
pub enum SafeBinsCmd {
    /// List the safe-bin names
    List,
    /// Add a binary name to the set
    Add { name: String },
    /// Remove a binary name from the set
    Remove { name: String },
    /// Replace the whole set
    Set { names: Vec<String> },
}

pub fn cmd_safe_bins(cmd: SafeBinsCmd, json: bool, config: Option<&Path>) -> miette::Result<()> {
    let mut engine = ApprovalEngine::open_at(config).into_diagnostic()?;

    match cmd {
        SafeBinsCmd::List => {}
        SafeBinsCmd::Add { name } => {
            engine.add_safe_bin(&name).into_diagnostic()?;
        }
        SafeBinsCmd::Remove { name } => {
            engine.remove_safe_bin(&name).into_diagnostic()?;
        }
        SafeBinsCmd::Set { names } => {
            engine.set_safe_bins(names).into_diagnostic()?;
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string(engine.safe_bins()).into_diagnostic()?
        );
    } else {
        for name in engine.safe_bins() {
            println!("{name}");
        }
    }

    Ok(())
}
