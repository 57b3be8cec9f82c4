// `policy` subcommands — show the active policy or patch its fields.

use std::path::Path;

use clap::Subcommand;
use miette::IntoDiagnostic;

use go_ahead::engine::ApprovalEngine;
use go_ahead::types::{ApprovalPolicy, PolicyPatch};

#[derive(Subcommand)]
pub enum PolicyCmd {
    /// Show the active policy
    Show,
    /// Change policy fields; unspecified fields are left alone
    Set {
        /// Security mode: deny, allowlist, or full
        #[arg(long)]
        security: Option<String>,
        /// Ask mode: off, on-miss, or always
        #[arg(long)]
        ask: Option<String>,
        /// Security mode applied while a human decision is pending
        #[arg(long, value_name = "MODE")]
        ask_fallback: Option<String>,
        /// Whether trusted packaged skills bypass the gate
        #[arg(long)]
        auto_allow_skills: Option<bool>,
    },
}

pub fn cmd_policy(cmd: PolicyCmd, json: bool, config: Option<&Path>) -> miette::Result<()> {
    let mut engine = ApprovalEngine::open_at(config).into_diagnostic()?;

    match cmd {
        PolicyCmd::Show => print_policy(engine.policy(), json)?,
        PolicyCmd::Set {
            security,
            ask,
            ask_fallback,
            auto_allow_skills,
        } => {
            let patch = PolicyPatch {
                security: security
                    .as_deref()
                    .map(|s| s.parse().map_err(|e: String| miette::miette!(e)))
                    .transpose()?,
                ask: ask
                    .as_deref()
                    .map(|s| s.parse().map_err(|e: String| miette::miette!(e)))
                    .transpose()?,
                ask_fallback: ask_fallback
                    .as_deref()
                    .map(|s| s.parse().map_err(|e: String| miette::miette!(e)))
                    .transpose()?,
                auto_allow_skills,
            };
            let policy = engine.patch_policy(&patch).into_diagnostic()?;
            print_policy(&policy, json)?;
        }
    }

    Ok(())
}

fn print_policy(policy: &ApprovalPolicy, json: bool) -> miette::Result<()> {
    if json {
        println!("{}", serde_json::to_string(policy).into_diagnostic()?);
    } else {
        println!("security:          {}", policy.security);
        println!("ask:               {}", policy.ask);
        println!("ask fallback:      {}", policy.ask_fallback);
        println!("auto allow skills: {}", policy.auto_allow_skills);
    }
    Ok(())
}
