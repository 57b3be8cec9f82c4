// `allowlist` subcommands — add, remove, and list trusted path patterns.

use std::path::Path;

use clap::Subcommand;
use colored::Colorize;
use miette::IntoDiagnostic;

use go_ahead::engine::ApprovalEngine;

#[derive(Subcommand)]
pub enum AllowlistCmd {
    /// Add a glob pattern authorizing an executable path
    Add {
        pattern: String,
        /// Optional human description
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove an entry by id or pattern
    Remove { key: String },
    /// List entries
    List,
}

pub fn cmd_allowlist(cmd: AllowlistCmd, json: bool, config: Option<&Path>) -> miette::Result<()> {
    let mut engine = ApprovalEngine::open_at(config).into_diagnostic()?;

    match cmd {
        AllowlistCmd::Add {
            pattern,
            description,
        } => {
            let entry = engine
                .add_allowlist(&pattern, description.as_deref())
                .into_diagnostic()?;
            if json {
                println!("{}", serde_json::to_string(&entry).into_diagnostic()?);
            } else {
                println!("added {} ({})", entry.pattern.bold(), entry.id.dimmed());
            }
        }
        AllowlistCmd::Remove { key } => {
            let removed = engine.remove_allowlist(&key).into_diagnostic()?;
            if json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else if removed {
                println!("removed {key}");
            } else {
                println!("no entry matches {key}");
            }
        }
        AllowlistCmd::List => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string(engine.allowlist()).into_diagnostic()?
                );
            } else if engine.allowlist().is_empty() {
                println!("allowlist is empty");
            } else {
                for entry in engine.allowlist() {
                    let uses = match entry.use_count {
                        0 => String::new(),
                        n => format!("  used {n}x"),
                    };
                    println!("{}  {}{uses}", entry.pattern.bold(), entry.id.dimmed());
                    if let Some(description) = &entry.description {
                        println!("    {description}");
                    }
                }
            }
        }
    }

    Ok(())
}
