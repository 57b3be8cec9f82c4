// `check` subcommand — evaluate one command against the active policy.

use std::path::{Path, PathBuf};

use colored::Colorize;
use miette::IntoDiagnostic;

use go_ahead::engine::ApprovalEngine;
use go_ahead::types::CheckContext;

pub fn cmd_check(
    command: &str,
    cwd: Option<PathBuf>,
    json: bool,
    config: Option<&Path>,
) -> miette::Result<()> {
    let engine = ApprovalEngine::open_at(config).into_diagnostic()?;
    let ctx = CheckContext {
        cwd,
        ..CheckContext::default()
    };
    let result = engine.check_approval(command, &ctx);
    let ask = engine.requires_approval(&result);

    if json {
        let payload = serde_json::json!({
            "allowed": result.allowed,
            "reason": result.reason,
            "requiresApproval": ask,
            "matchedEntries": result.matched_entries,
            "analysis": result.analysis,
        });
        println!("{}", serde_json::to_string(&payload).into_diagnostic()?);
        return Ok(());
    }

    let verdict = if result.allowed {
        "allowed".green().bold()
    } else {
        "denied".red().bold()
    };
    println!("{verdict}: {}", result.reason);
    for entry in &result.matched_entries {
        println!("  matched {} ({})", entry.pattern.bold(), entry.id.dimmed());
    }
    if ask {
        println!("{}", "a human approval prompt is warranted".yellow());
    }

    Ok(())
}
