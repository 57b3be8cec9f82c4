// Executable resolution.
//
// Resolution is re-run from scratch for every analysis: PATH and filesystem
// state may change between calls, and a stale resolution is a security
// hazard, so nothing here is cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolve an executable token to an absolute path.
///
/// A token containing a separator is tested directly (absolute) or relative
/// to `cwd`; a bare name is searched through each `PATH` directory in order.
/// Returns `None` when no candidate exists and is executable.
pub fn resolve_executable(
    name: &str,
    cwd: Option<&Path>,
    env: Option<&HashMap<String, String>>,
) -> Option<PathBuf> {
    let name = expand_tilde(name);

    if name.contains('/') || name.contains('\\') {
        let path = PathBuf::from(&name);
        let candidate = if path.is_absolute() {
            path
        } else {
            match cwd {
                Some(dir) => dir.join(path),
                None => std::env::current_dir().ok()?.join(path),
            }
        };
        return is_executable(&candidate).then_some(candidate);
    }

    let path_var = match env.and_then(|e| e.get("PATH").cloned()) {
        Some(v) => v,
        None => std::env::var("PATH").ok()?,
    };

    for dir in std::env::split_paths(&path_var) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        for candidate in candidates(&dir, &name) {
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Expand a leading `~` (alone or followed by a separator) to the caller's
/// home directory. `~user` forms are left untouched.
pub(crate) fn expand_tilde(name: &str) -> String {
    if let Some(rest) = name.strip_prefix('~')
        && (rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\'))
        && let Some(home) = dirs::home_dir()
    {
        return format!("{}{rest}", home.display());
    }
    name.to_string()
}

#[cfg(not(windows))]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

/// A bare name on Windows is tried as written and with each PATHEXT
/// extension, in order.
#[cfg(windows)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let exts = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    let mut out = vec![dir.join(name)];
    for ext in exts.split(';').filter(|e| !e.is_empty()) {
        out.push(dir.join(format!("{name}{ext}")));
    }
    out
}

/// A candidate passes if it exists, is a regular file, and is executable by
/// the current user. The executable-bit check only exists on POSIX.
fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_bin(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    fn path_env(dir: &Path) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("PATH".to_string(), dir.display().to_string());
        env
    }

    #[test]
    fn bare_name_found_on_path() {
        let dir = tempfile::tempdir().unwrap();
        let expected = fake_bin(dir.path(), "mytool");
        let env = path_env(dir.path());
        assert_eq!(resolve_executable("mytool", None, Some(&env)), Some(expected));
    }

    #[test]
    fn bare_name_missing_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let env = path_env(dir.path());
        assert_eq!(resolve_executable("nope", None, Some(&env)), None);
    }

    #[test]
    fn absolute_path_tested_directly() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_bin(dir.path(), "direct");
        assert_eq!(
            resolve_executable(&bin.display().to_string(), None, None),
            Some(bin)
        );
    }

    #[test]
    fn relative_path_resolves_against_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        let expected = fake_bin(&dir.path().join("bin"), "tool");
        assert_eq!(
            resolve_executable("bin/tool", Some(dir.path()), None),
            Some(expected)
        );
    }

    #[test]
    fn directory_is_not_executable() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("subdir");
        std::fs::create_dir(&sub).unwrap();
        assert_eq!(resolve_executable(&sub.display().to_string(), None, None), None);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain");
        std::fs::write(&path, "data").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(resolve_executable(&path.display().to_string(), None, None), None);
    }

    #[test]
    fn path_search_order_is_respected() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let winner = fake_bin(first.path(), "dup");
        fake_bin(second.path(), "dup");
        let joined = std::env::join_paths([first.path(), second.path()])
            .unwrap()
            .into_string()
            .unwrap();
        let mut env = HashMap::new();
        env.insert("PATH".to_string(), joined);
        assert_eq!(resolve_executable("dup", None, Some(&env)), Some(winner));
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home.display().to_string());
            assert_eq!(
                expand_tilde("~/bin/x"),
                format!("{}/bin/x", home.display())
            );
        }
        assert_eq!(expand_tilde("~other/x"), "~other/x");
    }
}
