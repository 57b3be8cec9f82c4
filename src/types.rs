// Shared domain types for the approval policy, allowlist, and command analysis.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The coarse security mode governing how commands are authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Refuse everything, even syntactically perfect commands.
    Deny,
    /// Clear each segment against the allowlist and safe-bin set.
    Allowlist,
    /// Allow everything that parses. An explicit escape hatch.
    Full,
}

impl std::fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityMode::Deny => write!(f, "deny"),
            SecurityMode::Allowlist => write!(f, "allowlist"),
            SecurityMode::Full => write!(f, "full"),
        }
    }
}

impl std::str::FromStr for SecurityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deny" => Ok(SecurityMode::Deny),
            "allowlist" => Ok(SecurityMode::Allowlist),
            "full" => Ok(SecurityMode::Full),
            other => Err(format!("unknown security mode: {other}")),
        }
    }
}

/// When a human confirmation prompt is warranted, independent of the
/// allow/deny outcome itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AskMode {
    /// Never prompt.
    Off,
    /// Prompt only for commands that would otherwise be refused.
    OnMiss,
    /// Prompt for every command.
    Always,
}

impl std::fmt::Display for AskMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AskMode::Off => write!(f, "off"),
            AskMode::OnMiss => write!(f, "on-miss"),
            AskMode::Always => write!(f, "always"),
        }
    }
}

impl std::str::FromStr for AskMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(AskMode::Off),
            "on-miss" => Ok(AskMode::OnMiss),
            "always" => Ok(AskMode::Always),
            other => Err(format!("unknown ask mode: {other}")),
        }
    }
}

/// The active approval policy. One per engine instance; every mutation is
/// persisted immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApprovalPolicy {
    pub security: SecurityMode,
    pub ask: AskMode,
    /// Security mode applied while a human decision is pending.
    pub ask_fallback: SecurityMode,
    /// Whether commands from trusted packaged skills bypass the gate.
    pub auto_allow_skills: bool,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        ApprovalPolicy {
            security: SecurityMode::Deny,
            ask: AskMode::OnMiss,
            ask_fallback: SecurityMode::Deny,
            auto_allow_skills: false,
        }
    }
}

/// A field-by-field policy update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyPatch {
    pub security: Option<SecurityMode>,
    pub ask: Option<AskMode>,
    pub ask_fallback: Option<SecurityMode>,
    pub auto_allow_skills: Option<bool>,
}

/// A persisted allowlist rule: a glob pattern authorizing an executable path.
///
/// The usage fields are telemetry updated only by explicit record-use calls,
/// never by the match check itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowlistEntry {
    pub id: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_resolved_path: Option<String>,
    #[serde(default)]
    pub use_count: u64,
}

/// A partial update to an allowlist entry; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryPatch {
    pub pattern: Option<String>,
    pub description: Option<String>,
}

/// One indivisible pipeline stage of a parsed command.
///
/// Immutable once constructed; produced fresh for every analysis so that the
/// resolved path always reflects current filesystem and PATH state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSegment {
    /// The raw source text of this stage.
    pub raw: String,
    /// The argv vector; `argv[0]` is the executable as written.
    pub argv: Vec<String>,
    /// The executable name as written.
    pub executable: String,
    /// Resolved absolute path; absent if not found or not executable.
    pub resolved: Option<PathBuf>,
    /// Whether the executable was written as a path (contains a separator
    /// or a leading `~`) versus a bare name requiring PATH search.
    pub is_path: bool,
}

/// The parse result for one full command string.
///
/// A command with no chain operators carries no chain grouping; callers
/// treat that as one implicit chain equal to the flat segment list. When
/// chains are present, `segments` equals their concatenation in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandAnalysis {
    #[serde(rename_all = "camelCase")]
    Parsed {
        segments: Vec<CommandSegment>,
        #[serde(skip_serializing_if = "Option::is_none")]
        chains: Option<Vec<Vec<CommandSegment>>>,
    },
    #[serde(rename_all = "camelCase")]
    Rejected { reason: String },
}

impl CommandAnalysis {
    pub fn is_parsed(&self) -> bool {
        matches!(self, CommandAnalysis::Parsed { .. })
    }

    /// All segments in order, or an empty slice for a rejected command.
    pub fn segments(&self) -> &[CommandSegment] {
        match self {
            CommandAnalysis::Parsed { segments, .. } => segments,
            CommandAnalysis::Rejected { .. } => &[],
        }
    }

    /// The rejection reason, if parsing failed.
    pub fn rejection(&self) -> Option<&str> {
        match self {
            CommandAnalysis::Parsed { .. } => None,
            CommandAnalysis::Rejected { reason } => Some(reason),
        }
    }
}

/// The outcome of checking one command against the active policy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResult {
    pub allowed: bool,
    /// Informative enough to show a human verbatim.
    pub reason: String,
    /// Allowlist entries that cleared at least one segment.
    pub matched_entries: Vec<AllowlistEntry>,
    pub analysis: CommandAnalysis,
}

/// Caller-supplied context for one analysis or approval check.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    /// Working directory for resolving relative executable paths.
    pub cwd: Option<PathBuf>,
    /// Environment snapshot; `PATH` is taken from here when present,
    /// otherwise from the process environment.
    pub env: Option<HashMap<String, String>>,
    /// Whether the command originates from a trusted packaged skill.
    pub from_skill: bool,
}
