// `export`, `import`, and `reset` — whole-config backup and restore.

use std::io::Read;
use std::path::Path;

use miette::IntoDiagnostic;

use go_ahead::engine::ApprovalEngine;

pub fn cmd_export(config: Option<&Path>) -> miette::Result<()> {
    let engine = ApprovalEngine::open_at(config).into_diagnostic()?;
    println!("{}", engine.export_config().into_diagnostic()?);
    Ok(())
}

pub fn cmd_import(config: Option<&Path>) -> miette::Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .into_diagnostic()?;

    let mut engine = ApprovalEngine::open_at(config).into_diagnostic()?;
    engine.import_config(&input).into_diagnostic()?;
    eprintln!("imported config to {}", engine.store_path().display());
    Ok(())
}

pub fn cmd_reset(config: Option<&Path>) -> miette::Result<()> {
    let mut engine = ApprovalEngine::open_at(config).into_diagnostic()?;
    engine.reset().into_diagnostic()?;
    eprintln!("restored built-in defaults at {}", engine.store_path().display());
    Ok(())
}
