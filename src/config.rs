// Approval config — the aggregate of policy, allowlist, and safe-bin set,
// persisted as a single owner-only JSON document.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::types::{AllowlistEntry, ApprovalPolicy};

/// The default safe-bin set: conventional read-only/text-processing tools.
pub const DEFAULT_SAFE_BINS: &[&str] = &[
    "awk", "cat", "cut", "echo", "grep", "head", "jq", "ls", "printf", "sed", "sort", "tail",
    "tr", "uniq", "wc",
];

/// Everything the engine persists: policy, allowlist, and safe bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApprovalConfig {
    pub policy: ApprovalPolicy,
    pub allowlist: Vec<AllowlistEntry>,
    pub safe_bins: BTreeSet<String>,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        ApprovalConfig {
            policy: ApprovalPolicy::default(),
            allowlist: Vec::new(),
            safe_bins: DEFAULT_SAFE_BINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ApprovalConfig {
    /// Safe-bin names are matched lowercased; normalize whatever was
    /// persisted or imported.
    pub(crate) fn normalize(&mut self) {
        self.safe_bins = self.safe_bins.iter().map(|s| s.to_lowercase()).collect();
    }
}

/// Resolve the backing-store path: explicit override, then
/// `$GO_AHEAD_CONFIG`, then `$XDG_CONFIG_HOME/go-ahead/approvals.json`,
/// then `~/.config/go-ahead/approvals.json`.
pub fn store_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = override_path {
        return Some(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("GO_AHEAD_CONFIG") {
        return Some(PathBuf::from(p));
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("go-ahead/approvals.json"));
    }
    dirs::home_dir().map(|h| h.join(".config/go-ahead/approvals.json"))
}

/// Load the config at `path`.
///
/// A missing or unparseable file falls back to built-in defaults (deny mode,
/// empty allowlist): corruption must never crash the engine or fail open.
pub fn load(path: &Path) -> ApprovalConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return ApprovalConfig::default(),
    };
    match serde_json::from_str::<ApprovalConfig>(&content) {
        Ok(mut config) => {
            config.normalize();
            config
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "unreadable approval config, using defaults");
            ApprovalConfig::default()
        }
    }
}

/// Persist the whole config, overwriting the store file.
///
/// Write failures propagate: callers need to know a policy change did not
/// durably persist.
pub fn save(config: &ApprovalConfig, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::write(path, e))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).map_err(|e| StoreError::write(path, e))?;
    restrict_permissions(path);
    Ok(())
}

/// Best-effort owner-only permissions after every write, in case the file
/// pre-existed with looser permissions.
fn restrict_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}
