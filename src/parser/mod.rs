// Shell-ish command parsing: chain split, pipeline split, tokenize, resolve.
//
// The accepted grammar is deliberately small: quoted/escaped words, `|`
// pipelines, and `&&`/`||`/`;` chain separators. Everything else
// (redirection, subshells, backticks, newlines) is a rejection, not a
// partial parse. Anything ambiguous is rejected rather than guessed.

mod lexer;


use lexer::{CharAction, scan};

use crate::resolve;
use crate::types::{CheckContext, CommandAnalysis, CommandSegment};

/// Split a command on `&&`, `||`, and bare `;` outside quotes.
///
/// Returns `None` when no chain operator is present: the whole string is one
/// implicit link. An empty link on either side of an operator is a hard
/// rejection — chains never produce empty links.
pub fn split_chains(input: &str) -> Result<Option<Vec<String>>, String> {
    let mut skip_next = false;
    let pieces = scan(input, true, |ch, lookahead| {
        if skip_next {
            skip_next = false;
            return CharAction::Skip;
        }
        match ch {
            '&' if lookahead == Some('&') => {
                skip_next = true;
                CharAction::Split
            }
            '|' if lookahead == Some('|') => {
                skip_next = true;
                CharAction::Split
            }
            ';' => CharAction::Split,
            _ => CharAction::Include,
        }
    })?;

    if pieces.len() == 1 {
        return Ok(None);
    }

    let links: Vec<String> = pieces.iter().map(|p| p.text.trim().to_string()).collect();
    if links.iter().any(|l| l.is_empty()) {
        return Err("empty command in chain".to_string());
    }
    Ok(Some(links))
}

/// Split one chain link on single `|` pipes.
///
/// Chain-only operators (`||`, `|&`, `&`, `;`) are illegal at this level: a
/// raw command containing them must already have been consumed by the chain
/// splitter, so seeing one here means the string is not a valid chain link.
pub fn split_pipeline(input: &str) -> Result<Vec<String>, String> {
    let pieces = scan(input, true, |ch, lookahead| match ch {
        '|' if lookahead == Some('|') => {
            CharAction::Reject("'||' is not a pipeline operator".to_string())
        }
        '|' if lookahead == Some('&') => CharAction::Reject("'|&' is not supported".to_string()),
        '|' => CharAction::Split,
        '&' => CharAction::Reject("background execution ('&') is not supported".to_string()),
        ';' => CharAction::Reject("';' is not allowed inside a pipeline".to_string()),
        _ => CharAction::Include,
    })?;

    let segments: Vec<String> = pieces.iter().map(|p| p.text.trim().to_string()).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err("empty pipeline segment".to_string());
    }
    Ok(segments)
}

/// Tokenize one pipeline stage into an argv vector, splitting on runs of
/// unquoted whitespace and resolving quotes and escapes into literal
/// characters. No globbing, no variable expansion: arguments stay opaque.
pub fn tokenize(input: &str) -> Result<Vec<String>, String> {
    let pieces = scan(input, false, |ch, _| {
        if ch == ' ' || ch == '\t' {
            CharAction::Split
        } else {
            CharAction::Include
        }
    })?;

    Ok(pieces
        .into_iter()
        .filter(|p| p.quoted || !p.text.is_empty())
        .map(|p| p.text)
        .collect())
}

/// Parse a full command string into segments and, when chain operators are
/// present, chain groupings, resolving each segment's executable.
///
/// The flat segment list always equals the concatenation of all chains in
/// order; an ungrouped analysis is one implicit chain. Resolution is re-run
/// from scratch on every call — no caching, since PATH and filesystem state
/// may change between calls.
pub fn analyze_command(command: &str, ctx: &CheckContext) -> CommandAnalysis {
    if command.trim().is_empty() {
        return CommandAnalysis::Rejected {
            reason: "empty command".to_string(),
        };
    }

    let links = match split_chains(command) {
        Ok(links) => links,
        Err(reason) => return CommandAnalysis::Rejected { reason },
    };
    let grouped = links.is_some();
    let links = links.unwrap_or_else(|| vec![command.trim().to_string()]);

    let mut segments = Vec::new();
    let mut chains = Vec::new();
    for link in &links {
        let stages = match split_pipeline(link) {
            Ok(stages) => stages,
            Err(reason) => return CommandAnalysis::Rejected { reason },
        };
        let mut chain = Vec::new();
        for stage in stages {
            match build_segment(&stage, ctx) {
                Ok(segment) => {
                    chain.push(segment.clone());
                    segments.push(segment);
                }
                Err(reason) => return CommandAnalysis::Rejected { reason },
            }
        }
        chains.push(chain);
    }

    CommandAnalysis::Parsed {
        segments,
        chains: grouped.then_some(chains),
    }
}

fn build_segment(stage: &str, ctx: &CheckContext) -> Result<CommandSegment, String> {
    let argv = tokenize(stage)?;
    let Some(executable) = argv.first().cloned() else {
        return Err("empty command segment".to_string());
    };
    let is_path =
        executable.contains('/') || executable.contains('\\') || executable.starts_with('~');
    let resolved = resolve::resolve_executable(&executable, ctx.cwd.as_deref(), ctx.env.as_ref());
    Ok(CommandSegment {
        raw: stage.to_string(),
        argv,
        executable,
        resolved,
        is_path,
    })
}
