// Quote-aware character scanner shared by the chain splitter, the pipeline
// splitter, and the tokenizer. Single point of truth for quoting semantics.

/// Classification of one unquoted, unescaped character by a scan callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum CharAction {
    /// End the current piece; the character itself is dropped.
    Split,
    /// Drop the character without ending the piece.
    Skip,
    /// Append the character to the current piece.
    Include,
    /// Abort the whole scan with a rejection reason.
    Reject(String),
}

/// One piece produced by `scan`: its text plus whether any quoting applied,
/// so an explicitly quoted empty word (`''` or `""`) survives tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Piece {
    pub text: String,
    pub quoted: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    None,
    Single,
    Double,
}

/// Characters that are never accepted outside single quotes: redirection,
/// command substitution, subshells, and embedded line breaks.
fn disallowed(ch: char, lookahead: Option<char>) -> Option<String> {
    match ch {
        '>' | '<' => Some(format!("redirection ('{ch}') is not supported")),
        '`' => Some("backtick command substitution is not supported".to_string()),
        '\n' | '\r' => Some("embedded newlines are not supported".to_string()),
        '(' | ')' => Some("subshells and parentheses are not supported".to_string()),
        '$' if lookahead == Some('(') => {
            Some("command substitution '$(' is not supported".to_string())
        }
        _ => None,
    }
}

/// Walk `input` one character at a time, tracking quote and escape state,
/// and classify every unquoted, unescaped character through `classify`.
///
/// With `keep_quotes` set, quote and escape characters are copied through
/// verbatim so each piece can be re-scanned later (splitter behavior); unset,
/// they are resolved into literal characters (tokenizer behavior).
///
/// Single quotes suppress all interpretation until the next single quote.
/// Inside double quotes a backslash escapes only `\`, `"`, and `$`; any
/// other backslash stays literal. Outside quotes a backslash escapes the
/// following character verbatim, including a quote character. The hard
/// rejections from `disallowed` apply everywhere except inside single
/// quotes, and a backslash does not rescue them.
pub(super) fn scan<F>(input: &str, keep_quotes: bool, mut classify: F) -> Result<Vec<Piece>, String>
where
    F: FnMut(char, Option<char>) -> CharAction,
{
    let chars: Vec<char> = input.chars().collect();
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut state = QuoteState::None;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let lookahead = chars.get(i + 1).copied();
        i += 1;

        if state == QuoteState::Single {
            if ch == '\'' {
                state = QuoteState::None;
                if keep_quotes {
                    current.push(ch);
                }
            } else {
                current.push(ch);
            }
            continue;
        }

        if let Some(reason) = disallowed(ch, lookahead) {
            return Err(reason);
        }

        if escaped {
            escaped = false;
            if state == QuoteState::Double && !matches!(ch, '\\' | '"' | '$') && !keep_quotes {
                // Non-escaping backslash inside double quotes stays literal.
                current.push('\\');
            }
            current.push(ch);
            continue;
        }

        if ch == '\\' {
            escaped = true;
            if keep_quotes {
                current.push(ch);
            }
            continue;
        }

        if state == QuoteState::Double {
            if ch == '"' {
                state = QuoteState::None;
                if keep_quotes {
                    current.push(ch);
                }
            } else {
                current.push(ch);
            }
            continue;
        }

        match ch {
            '\'' => {
                state = QuoteState::Single;
                quoted = true;
                if keep_quotes {
                    current.push(ch);
                }
            }
            '"' => {
                state = QuoteState::Double;
                quoted = true;
                if keep_quotes {
                    current.push(ch);
                }
            }
            _ => match classify(ch, lookahead) {
                CharAction::Split => {
                    pieces.push(Piece {
                        text: std::mem::take(&mut current),
                        quoted,
                    });
                    quoted = false;
                }
                CharAction::Skip => {}
                CharAction::Include => current.push(ch),
                CharAction::Reject(reason) => return Err(reason),
            },
        }
    }

    if escaped || state != QuoteState::None {
        return Err("unterminated shell quote/escape".to_string());
    }

    pieces.push(Piece {
        text: current,
        quoted,
    });
    Ok(pieces)
}
