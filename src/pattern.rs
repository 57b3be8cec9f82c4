// Allowlist glob patterns, compiled to case-insensitive path matchers.

use std::path::Path;

use regex::Regex;

/// A compiled allowlist pattern.
///
/// Patterns must be path-shaped — contain a separator or a leading `~`. A
/// bare name never matches any path, so an allowlist entry cannot silently
/// broaden to match unrelated binaries found elsewhere on PATH.
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
}

impl PathPattern {
    /// Compile a glob pattern: `*` matches within one path component, `**`
    /// crosses separators, `?` matches a single non-separator character,
    /// everything else is literal. A leading `~` is expanded before
    /// compiling. Returns `None` for patterns that are not path-shaped.
    pub fn compile(pattern: &str) -> Option<PathPattern> {
        if !is_path_shaped(pattern) {
            return None;
        }
        let normalized = normalize(&crate::resolve::expand_tilde(pattern));

        let mut re = String::from("^");
        let mut chars = normalized.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '*' => {
                    if chars.peek() == Some(&'*') {
                        chars.next();
                        re.push_str(".*");
                    } else {
                        re.push_str("[^/]*");
                    }
                }
                '?' => re.push_str("[^/]"),
                _ => re.push_str(&regex::escape(&ch.to_string())),
            }
        }
        re.push('$');

        // The translation above only emits valid syntax, but guard rather
        // than unwrap in library code.
        Regex::new(&re).ok().map(|regex| PathPattern { regex })
    }

    /// Match against a candidate path, normalized the same way as the
    /// pattern.
    pub fn matches(&self, path: &Path) -> bool {
        self.regex.is_match(&normalize(&path.display().to_string()))
    }
}

/// Whether a pattern references a filesystem path at all.
pub fn is_path_shaped(pattern: &str) -> bool {
    pattern.contains('/') || pattern.contains('\\') || pattern.starts_with('~')
}

/// Normalize for comparison: forward slashes, lowercase, and on Windows the
/// `\\?\` verbatim prefix stripped.
fn normalize(path: &str) -> String {
    let mut p = path.replace('\\', "/");
    if cfg!(windows) && let Some(rest) = p.strip_prefix("//?/") {
        p = rest.to_string();
    }
    p.make_ascii_lowercase();
    p
}
