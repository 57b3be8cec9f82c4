// `analyze` subcommand — print the parse result without any policy judgement.

use std::path::{Path, PathBuf};

use colored::Colorize;
use miette::IntoDiagnostic;

use go_ahead::engine::ApprovalEngine;
use go_ahead::types::{CheckContext, CommandAnalysis};

pub fn cmd_analyze(
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
    let analysis = engine.analyze_command(command, &ctx);

    if json {
        println!("{}", serde_json::to_string(&analysis).into_diagnostic()?);
        return Ok(());
    }

    match &analysis {
        CommandAnalysis::Rejected { reason } => {
            println!("{}: {reason}", "rejected".red().bold());
        }
        CommandAnalysis::Parsed { segments, chains } => {
            match chains {
                None => println!("1 implicit chain, {} segment(s)", segments.len()),
                Some(chains) => {
                    println!("{} chain(s), {} segment(s)", chains.len(), segments.len())
                }
            }
            for segment in segments {
                let resolved = match &segment.resolved {
                    Some(path) => path.display().to_string(),
                    None => "(unresolved)".to_string(),
                };
                println!("  {} {}", segment.argv.join(" ").bold(), resolved.dimmed());
            }
        }
    }

    Ok(())
}
