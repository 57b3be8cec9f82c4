// Hook mode — read a PreToolUse payload from stdin, evaluate, respond.
//
// Invoked when the binary runs with no subcommand on a non-terminal stdin,
// exactly as an agent hook dispatcher does in production.

use std::io::Read;
use std::path::{Path, PathBuf};

use miette::IntoDiagnostic;

use go_ahead::engine::ApprovalEngine;
use go_ahead::types::CheckContext;

pub fn cmd_hook(config: Option<&Path>) -> miette::Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .take(65536)
        .read_to_string(&mut input)
        .into_diagnostic()?;

    let payload: serde_json::Value = serde_json::from_str(&input)
        .map_err(|e| miette::miette!("invalid hook payload: {e}"))?;

    // Only Bash commands pass through the gate; other tools exit silently.
    let tool_name = payload
        .get("tool_name")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if tool_name != "Bash" {
        return Ok(());
    }

    let command = payload
        .get("tool_input")
        .and_then(|v| v.get("command"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| miette::miette!("missing tool_input.command"))?;
    let cwd = payload
        .get("cwd")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);

    let engine = ApprovalEngine::open_at(config).into_diagnostic()?;
    let ctx = CheckContext {
        cwd,
        ..CheckContext::default()
    };
    let result = engine.check_approval(command, &ctx);

    let decision = if result.allowed {
        "allow"
    } else if engine.requires_approval(&result) {
        "ask"
    } else {
        "deny"
    };

    let response = serde_json::json!({
        "hookSpecificOutput": {
            "hookEventName": "PreToolUse",
            "permissionDecision": decision,
            "permissionDecisionReason": result.reason,
        }
    });
    println!("{}", serde_json::to_string(&response).into_diagnostic()?);
    Ok(())
}
