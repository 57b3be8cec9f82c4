// CLI interface — clap derive with TTY detection

use std::io::IsTerminal;

use clap::{CommandFactory, Parser, Subcommand};

mod cmd_allowlist;
mod cmd_analyze;
mod cmd_check;
mod cmd_config;
mod cmd_hook;
mod cmd_policy;
mod cmd_safe_bins;

#[derive(Parser)]
#[command(name = "go-ahead", version, about = "Approval gate for unattended shell commands")]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to the approval store (overrides $GO_AHEAD_CONFIG and the default location)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a command may run unattended
    Check {
        command: String,
        /// Working directory for resolving relative executable paths
        #[arg(long, value_name = "DIR")]
        cwd: Option<std::path::PathBuf>,
    },
    /// Parse a command and print its segments and chains
    Analyze {
        command: String,
        /// Working directory for resolving relative executable paths
        #[arg(long, value_name = "DIR")]
        cwd: Option<std::path::PathBuf>,
    },
    /// Manage the allowlist of trusted executable paths
    #[command(subcommand)]
    Allowlist(cmd_allowlist::AllowlistCmd),
    /// Show or change the approval policy
    #[command(subcommand)]
    Policy(cmd_policy::PolicyCmd),
    /// Manage the set of inherently low-risk binaries
    #[command(subcommand, name = "safe-bins")]
    SafeBins(cmd_safe_bins::SafeBinsCmd),
    /// Print the current config as JSON
    Export,
    /// Replace the config from JSON on stdin
    Import,
    /// Restore built-in defaults
    Reset,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(false)
                .build(),
        )
    }))
    .ok();

    if let Err(e) = run() {
        eprintln!("{e:?}");
        // Exit code 2 signals a blocking error to the calling agent hook.
        // stderr is fed back so the caller can adjust its plan.
        std::process::exit(2);
    }
}

/// Main entry point for the CLI.
fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Some(Command::Check { command, cwd }) => {
            cmd_check::cmd_check(&command, cwd, cli.json, config)?
        }
        Some(Command::Analyze { command, cwd }) => {
            cmd_analyze::cmd_analyze(&command, cwd, cli.json, config)?
        }
        Some(Command::Allowlist(cmd)) => cmd_allowlist::cmd_allowlist(cmd, cli.json, config)?,
        Some(Command::Policy(cmd)) => cmd_policy::cmd_policy(cmd, cli.json, config)?,
        Some(Command::SafeBins(cmd)) => cmd_safe_bins::cmd_safe_bins(cmd, cli.json, config)?,
        Some(Command::Export) => cmd_config::cmd_export(config)?,
        Some(Command::Import) => cmd_config::cmd_import(config)?,
        Some(Command::Reset) => cmd_config::cmd_reset(config)?,
        None => {
            if std::io::stdin().is_terminal() {
                Cli::command()
                    .print_help()
                    .map_err(|e| miette::miette!("Failed to print help: {e}"))?;
                println!();
            } else {
                cmd_hook::cmd_hook(config)?;
            }
        }
    }

    Ok(())
}
