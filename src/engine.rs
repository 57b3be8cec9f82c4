// Approval engine — owns the security policy, allowlist, and safe-bin set,
// classifies commands against them, and persists every mutation.
//
// `check_approval` is a pure function of the current config and the input
// command: it records no telemetry and writes nothing, so dry-run and
// explain calls never mutate state. Only the explicit mutation operations
// (and `record_use`) touch the backing store.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::config::{self, ApprovalConfig};
use crate::errors::StoreError;
use crate::parser;
use crate::pattern::PathPattern;
use crate::types::{
    AllowlistEntry, ApprovalPolicy, ApprovalResult, AskMode, CheckContext, CommandAnalysis,
    CommandSegment, EntryPatch, PolicyPatch, SecurityMode,
};

pub struct ApprovalEngine {
    config: ApprovalConfig,
    store: PathBuf,
}

impl ApprovalEngine {
    /// Construct an engine backed by the store at `path`, merging persisted
    /// values over built-in defaults. An unreadable store falls back to
    /// defaults; it never fails open.
    pub fn open(path: PathBuf) -> ApprovalEngine {
        let config = config::load(&path);
        ApprovalEngine {
            config,
            store: path,
        }
    }

    /// Engine over the resolved store location (`override_path`, then env
    /// var, then the user's config directory).
    pub fn open_at(override_path: Option<&Path>) -> Result<ApprovalEngine, StoreError> {
        let path = config::store_path(override_path).ok_or(StoreError::NoConfigDir)?;
        Ok(ApprovalEngine::open(path))
    }

    pub fn policy(&self) -> &ApprovalPolicy {
        &self.config.policy
    }

    pub fn allowlist(&self) -> &[AllowlistEntry] {
        &self.config.allowlist
    }

    pub fn safe_bins(&self) -> &BTreeSet<String> {
        &self.config.safe_bins
    }

    pub fn store_path(&self) -> &Path {
        &self.store
    }

    /// Parse a command into segments and chains without any policy
    /// judgement.
    pub fn analyze_command(&self, command: &str, ctx: &CheckContext) -> CommandAnalysis {
        parser::analyze_command(command, ctx)
    }

    /// Classify a command against the active policy.
    pub fn check_approval(&self, command: &str, ctx: &CheckContext) -> ApprovalResult {
        let analysis = self.analyze_command(command, ctx);
        let (allowed, reason, matched_entries) = self.evaluate(&analysis, ctx);
        tracing::debug!(command, allowed, %reason, "approval check");
        ApprovalResult {
            allowed,
            reason,
            matched_entries,
            analysis,
        }
    }

    fn evaluate(
        &self,
        analysis: &CommandAnalysis,
        ctx: &CheckContext,
    ) -> (bool, String, Vec<AllowlistEntry>) {
        // Parse failure dominates every policy mode.
        let CommandAnalysis::Parsed { segments, .. } = analysis else {
            let reason = analysis.rejection().unwrap_or("unparseable command");
            return (false, reason.to_string(), Vec::new());
        };

        if ctx.from_skill && self.config.policy.auto_allow_skills {
            return (true, "trusted skill command".to_string(), Vec::new());
        }

        match self.config.policy.security {
            SecurityMode::Deny => (false, "security policy is set to deny".to_string(), Vec::new()),
            SecurityMode::Full => (true, "security policy is set to full".to_string(), Vec::new()),
            SecurityMode::Allowlist => {
                let mut matched: Vec<AllowlistEntry> = Vec::new();
                for segment in segments {
                    if let Some(entry) = self.allowlist_match(segment) {
                        if !matched.iter().any(|e| e.id == entry.id) {
                            matched.push(entry.clone());
                        }
                        continue;
                    }
                    if self.is_safe_invocation(segment) {
                        continue;
                    }
                    // The first failing segment denies the whole command;
                    // partial allow of a chain is not a supported outcome.
                    return (
                        false,
                        "command not in allowlist or safe bins".to_string(),
                        Vec::new(),
                    );
                }
                (
                    true,
                    "all segments cleared allowlist/safe-bin checks".to_string(),
                    matched,
                )
            }
        }
    }

    /// First allowlist entry whose pattern matches the segment's resolved
    /// path. Matching requires a resolved path; patterns that are not
    /// path-shaped never compile, so bare-name entries are skipped.
    fn allowlist_match(&self, segment: &CommandSegment) -> Option<&AllowlistEntry> {
        let resolved = segment.resolved.as_deref()?;
        self.config
            .allowlist
            .iter()
            .find(|entry| PathPattern::compile(&entry.pattern).is_some_and(|p| p.matches(resolved)))
    }

    /// Safe-bin gate: the executable's lowercased name is in the safe set,
    /// it resolved to a real executable, and no non-flag argument is
    /// path-shaped. A bare `-` is the stdin marker, not a path.
    fn is_safe_invocation(&self, segment: &CommandSegment) -> bool {
        if !self
            .config
            .safe_bins
            .contains(&segment.executable.to_lowercase())
        {
            return false;
        }
        // An unresolvable "safe" name is never treated as safe.
        if segment.resolved.is_none() {
            return false;
        }
        segment.argv.iter().skip(1).all(|arg| {
            arg == "-" || arg.starts_with('-') || !(arg.contains('/') || arg.contains('\\'))
        })
    }

    /// Whether the external confirmation flow should prompt a human for
    /// this result. Ask-on-miss means "prompt only for what would otherwise
    /// be refused": parse failures and allowlist-mode denials.
    pub fn requires_approval(&self, result: &ApprovalResult) -> bool {
        match self.config.policy.ask {
            AskMode::Always => true,
            AskMode::Off => false,
            AskMode::OnMiss => {
                !result.allowed
                    && (!result.analysis.is_parsed()
                        || self.config.policy.security == SecurityMode::Allowlist)
            }
        }
    }

    /// Record a human-approved use of an allowlist entry and persist the
    /// telemetry. Invoked by the external confirmation flow, never by
    /// `check_approval`. Unknown ids are a no-op returning false.
    pub fn record_use(
        &mut self,
        entry_id: &str,
        command: &str,
        resolved_path: Option<&Path>,
    ) -> Result<bool, StoreError> {
        let Some(entry) = self.config.allowlist.iter_mut().find(|e| e.id == entry_id) else {
            return Ok(false);
        };
        entry.last_used_at = Some(Utc::now());
        entry.last_command = Some(command.to_string());
        if let Some(path) = resolved_path {
            entry.last_resolved_path = Some(path.display().to_string());
        }
        entry.use_count += 1;
        self.persist()?;
        Ok(true)
    }

    /// Add an allowlist entry. Idempotent by case-insensitive pattern
    /// equality: adding a duplicate returns the existing entry unchanged.
    pub fn add_allowlist(
        &mut self,
        pattern: &str,
        description: Option<&str>,
    ) -> Result<AllowlistEntry, StoreError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(StoreError::EmptyPattern);
        }
        if let Some(existing) = self
            .config
            .allowlist
            .iter()
            .find(|e| e.pattern.eq_ignore_ascii_case(pattern))
        {
            return Ok(existing.clone());
        }
        let entry = AllowlistEntry {
            id: Uuid::new_v4().to_string(),
            pattern: pattern.to_string(),
            description: description.map(|d| d.to_string()),
            created_at: Utc::now(),
            last_used_at: None,
            last_command: None,
            last_resolved_path: None,
            use_count: 0,
        };
        self.config.allowlist.push(entry.clone());
        self.persist()?;
        Ok(entry)
    }

    /// Remove an entry by id or by case-insensitive pattern. Unknown keys
    /// are a no-op returning false.
    pub fn remove_allowlist(&mut self, key: &str) -> Result<bool, StoreError> {
        let before = self.config.allowlist.len();
        self.config
            .allowlist
            .retain(|e| e.id != key && !e.pattern.eq_ignore_ascii_case(key));
        if self.config.allowlist.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Patch individual fields of an entry. Returns the updated entry, or
    /// None for an unknown id.
    pub fn update_allowlist(
        &mut self,
        id: &str,
        patch: &EntryPatch,
    ) -> Result<Option<AllowlistEntry>, StoreError> {
        if patch.pattern.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(StoreError::EmptyPattern);
        }
        let Some(entry) = self.config.allowlist.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(pattern) = &patch.pattern {
            entry.pattern = pattern.trim().to_string();
        }
        if let Some(description) = &patch.description {
            entry.description = Some(description.clone());
        }
        let updated = entry.clone();
        self.persist()?;
        Ok(Some(updated))
    }

    /// Replace the policy wholesale.
    pub fn set_policy(&mut self, policy: ApprovalPolicy) -> Result<(), StoreError> {
        self.config.policy = policy;
        self.persist()
    }

    /// Patch individual policy fields, returning the updated policy.
    pub fn patch_policy(&mut self, patch: &PolicyPatch) -> Result<ApprovalPolicy, StoreError> {
        if let Some(security) = patch.security {
            self.config.policy.security = security;
        }
        if let Some(ask) = patch.ask {
            self.config.policy.ask = ask;
        }
        if let Some(fallback) = patch.ask_fallback {
            self.config.policy.ask_fallback = fallback;
        }
        if let Some(auto) = patch.auto_allow_skills {
            self.config.policy.auto_allow_skills = auto;
        }
        self.persist()?;
        Ok(self.config.policy)
    }

    /// Replace the safe-bin set wholesale. Names are lowercased; empties
    /// are dropped.
    pub fn set_safe_bins(
        &mut self,
        bins: impl IntoIterator<Item = String>,
    ) -> Result<(), StoreError> {
        self.config.safe_bins = bins
            .into_iter()
            .map(|b| b.trim().to_lowercase())
            .filter(|b| !b.is_empty())
            .collect();
        self.persist()
    }

    pub fn add_safe_bin(&mut self, name: &str) -> Result<bool, StoreError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(StoreError::EmptySafeBin);
        }
        if !self.config.safe_bins.insert(name) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn remove_safe_bin(&mut self, name: &str) -> Result<bool, StoreError> {
        if !self.config.safe_bins.remove(&name.trim().to_lowercase()) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Serialize the whole config for backup.
    pub fn export_config(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.config)?)
    }

    /// Restore from an exported document. Unlike load-time corruption
    /// fallback, an explicit import of invalid JSON is an error.
    pub fn import_config(&mut self, json: &str) -> Result<(), StoreError> {
        let mut config: ApprovalConfig = serde_json::from_str(json)?;
        config.normalize();
        self.config = config;
        self.persist()
    }

    /// Restore built-in defaults and persist them immediately.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.config = ApprovalConfig::default();
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        config::save(&self.config, &self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    // -- helpers --------------------------------------------------------

    fn engine_in(dir: &TempDir) -> ApprovalEngine {
        ApprovalEngine::open(dir.path().join("approvals.json"))
    }

    /// Create an executable file so resolution and allowlist matching have
    /// something real to find.
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

    /// Context whose PATH contains only `dir`.
    fn ctx_with_path(dir: &Path) -> CheckContext {
        let mut env = HashMap::new();
        env.insert("PATH".to_string(), dir.display().to_string());
        CheckContext {
            env: Some(env),
            ..CheckContext::default()
        }
    }

    fn allowlist_mode(engine: &mut ApprovalEngine) {
        engine
            .patch_policy(&PolicyPatch {
                security: Some(SecurityMode::Allowlist),
                ..PolicyPatch::default()
            })
            .unwrap();
    }

    // -- security modes -------------------------------------------------

    #[test]
    fn deny_mode_refuses_everything() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        let ctx = CheckContext::default();

        // Syntactically perfect and syntactically invalid alike.
        let result = engine.check_approval("ls -la", &ctx);
        assert!(!result.allowed);
        assert_eq!(result.reason, "security policy is set to deny");

        assert!(!engine.check_approval("echo hi > f", &ctx).allowed);
    }

    #[test]
    fn full_mode_allows_anything_parseable() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);
        engine
            .patch_policy(&PolicyPatch {
                security: Some(SecurityMode::Full),
                ..PolicyPatch::default()
            })
            .unwrap();

        let ctx = CheckContext::default();
        let result = engine.check_approval("definitely-not-real --flag", &ctx);
        assert!(result.allowed);
        assert_eq!(result.reason, "security policy is set to full");
    }

    #[test]
    fn parse_failure_dominates_full_mode() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);
        engine
            .patch_policy(&PolicyPatch {
                security: Some(SecurityMode::Full),
                ..PolicyPatch::default()
            })
            .unwrap();

        let result = engine.check_approval("echo `date`", &CheckContext::default());
        assert!(!result.allowed);
        assert!(result.reason.contains("backtick"));
        assert!(result.matched_entries.is_empty());
    }

    // -- allowlist matching ---------------------------------------------

    #[test]
    fn allowlist_pattern_clears_resolved_path() {
        let dir = TempDir::new().unwrap();
        let bins = TempDir::new().unwrap();
        std::fs::create_dir(bins.path().join("sub")).unwrap();
        let bin = fake_bin(&bins.path().join("sub"), "deploy");

        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);
        let entry = engine
            .add_allowlist(&format!("{}/**", bins.path().display()), None)
            .unwrap();

        let result =
            engine.check_approval(&format!("{} --x", bin.display()), &CheckContext::default());
        assert!(result.allowed);
        assert_eq!(result.matched_entries.len(), 1);
        assert_eq!(result.matched_entries[0].id, entry.id);
    }

    #[test]
    fn bare_name_entry_never_matches() {
        let dir = TempDir::new().unwrap();
        let bins = TempDir::new().unwrap();
        fake_bin(bins.path(), "mytool");

        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);
        engine.add_allowlist("mytool", None).unwrap();

        let result = engine.check_approval("mytool", &ctx_with_path(bins.path()));
        assert!(!result.allowed);
        assert_eq!(result.reason, "command not in allowlist or safe bins");
    }

    #[test]
    fn unresolved_segment_cannot_match_allowlist() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);
        engine.add_allowlist("/usr/local/bin/**", None).unwrap();

        let result = engine.check_approval(
            "no-such-binary-1234",
            &ctx_with_path(Path::new("/nonexistent")),
        );
        assert!(!result.allowed);
    }

    // -- safe-bin gate ---------------------------------------------------

    #[test]
    fn safe_bin_with_plain_args_is_allowed() {
        let dir = TempDir::new().unwrap();
        let bins = TempDir::new().unwrap();
        fake_bin(bins.path(), "cat");

        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);

        let result = engine.check_approval("cat notes.txt", &ctx_with_path(bins.path()));
        assert!(result.allowed, "{}", result.reason);
        assert!(result.matched_entries.is_empty());
    }

    #[test]
    fn safe_bin_with_path_shaped_arg_is_denied() {
        let dir = TempDir::new().unwrap();
        let bins = TempDir::new().unwrap();
        fake_bin(bins.path(), "cat");

        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);

        let result = engine.check_approval("cat /etc/shadow", &ctx_with_path(bins.path()));
        assert!(!result.allowed);
        assert_eq!(result.reason, "command not in allowlist or safe bins");
    }

    #[test]
    fn safe_bin_allows_flags_and_stdin_marker() {
        let dir = TempDir::new().unwrap();
        let bins = TempDir::new().unwrap();
        fake_bin(bins.path(), "grep");

        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);

        let result = engine.check_approval("grep -i needle -", &ctx_with_path(bins.path()));
        assert!(result.allowed, "{}", result.reason);
    }

    #[test]
    fn unresolvable_safe_name_is_not_safe() {
        let dir = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();

        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);

        // `cat` is in the default safe-bin set but resolves nowhere here.
        let result = engine.check_approval("cat notes.txt", &ctx_with_path(empty.path()));
        assert!(!result.allowed);
    }

    #[test]
    fn safe_bin_name_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let bins = TempDir::new().unwrap();
        fake_bin(bins.path(), "CAT");

        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);

        let result = engine.check_approval("CAT notes.txt", &ctx_with_path(bins.path()));
        assert!(result.allowed, "{}", result.reason);
    }

    #[test]
    fn chain_denied_if_any_segment_fails() {
        let dir = TempDir::new().unwrap();
        let bins = TempDir::new().unwrap();
        fake_bin(bins.path(), "cat");
        fake_bin(bins.path(), "grep");

        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);

        let ctx = ctx_with_path(bins.path());
        assert!(engine.check_approval("cat a.txt | grep x", &ctx).allowed);
        // `rm` resolves nowhere and is not a safe bin: the whole chain fails.
        assert!(!engine.check_approval("cat a.txt && rm x | grep y", &ctx).allowed);
    }

    // -- requires_approval ----------------------------------------------

    #[test]
    fn ask_always_prompts_even_when_allowed() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);
        engine
            .patch_policy(&PolicyPatch {
                security: Some(SecurityMode::Full),
                ask: Some(AskMode::Always),
                ..PolicyPatch::default()
            })
            .unwrap();

        let result = engine.check_approval("ls", &CheckContext::default());
        assert!(result.allowed);
        assert!(engine.requires_approval(&result));
    }

    #[test]
    fn ask_off_never_prompts() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);
        engine
            .patch_policy(&PolicyPatch {
                ask: Some(AskMode::Off),
                ..PolicyPatch::default()
            })
            .unwrap();

        let result = engine.check_approval("ls", &CheckContext::default());
        assert!(!engine.requires_approval(&result));
    }

    #[test]
    fn ask_on_miss_prompts_for_allowlist_denials_and_parse_failures() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);

        // Deny-mode denial is an explicit refusal, not a miss.
        let denied = engine.check_approval("ls", &CheckContext::default());
        assert!(!engine.requires_approval(&denied));

        // Parse failures prompt regardless of mode.
        let unparseable = engine.check_approval("ls > f", &CheckContext::default());
        assert!(engine.requires_approval(&unparseable));

        allowlist_mode(&mut engine);
        let missed = engine.check_approval("unknown-tool", &CheckContext::default());
        assert!(!missed.allowed);
        assert!(engine.requires_approval(&missed));
    }

    // -- allowlist CRUD --------------------------------------------------

    #[test]
    fn add_allowlist_is_idempotent_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);

        let first = engine.add_allowlist("/usr/local/bin/**", None).unwrap();
        let second = engine.add_allowlist("/USR/LOCAL/BIN/**", None).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(engine.allowlist().len(), 1);
        // The original entry is returned unchanged.
        assert_eq!(second.pattern, "/usr/local/bin/**");
    }

    #[test]
    fn add_allowlist_rejects_empty_pattern() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);
        assert!(matches!(
            engine.add_allowlist("  ", None),
            Err(StoreError::EmptyPattern)
        ));
    }

    #[test]
    fn remove_allowlist_by_id_and_pattern() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);
        let entry = engine.add_allowlist("/a/**", None).unwrap();
        engine.add_allowlist("/b/**", None).unwrap();

        assert!(engine.remove_allowlist(&entry.id).unwrap());
        assert!(engine.remove_allowlist("/B/**").unwrap());
        assert!(engine.allowlist().is_empty());
        assert!(!engine.remove_allowlist("/c/**").unwrap());
    }

    #[test]
    fn update_allowlist_patches_fields() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);
        let entry = engine.add_allowlist("/a/**", None).unwrap();

        let updated = engine
            .update_allowlist(
                &entry.id,
                &EntryPatch {
                    description: Some("deploy scripts".into()),
                    ..EntryPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("deploy scripts"));
        assert_eq!(updated.pattern, "/a/**");

        assert!(engine.update_allowlist("no-such-id", &EntryPatch::default()).unwrap().is_none());
        assert!(matches!(
            engine.update_allowlist(
                &entry.id,
                &EntryPatch {
                    pattern: Some("  ".into()),
                    ..EntryPatch::default()
                }
            ),
            Err(StoreError::EmptyPattern)
        ));
    }

    #[test]
    fn record_use_updates_telemetry_but_check_does_not() {
        let dir = TempDir::new().unwrap();
        let bins = TempDir::new().unwrap();
        let bin = fake_bin(bins.path(), "tool");

        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);
        let entry = engine
            .add_allowlist(&format!("{}/*", bins.path().display()), None)
            .unwrap();

        // A pure check records nothing.
        let cmd = bin.display().to_string();
        let result = engine.check_approval(&cmd, &CheckContext::default());
        assert!(result.allowed);
        assert_eq!(engine.allowlist()[0].use_count, 0);
        assert!(engine.allowlist()[0].last_used_at.is_none());

        assert!(engine.record_use(&entry.id, &cmd, Some(&bin)).unwrap());
        let recorded = &engine.allowlist()[0];
        assert_eq!(recorded.use_count, 1);
        assert!(recorded.last_used_at.is_some());
        assert_eq!(recorded.last_command.as_deref(), Some(cmd.as_str()));
        assert_eq!(
            recorded.last_resolved_path.as_deref(),
            Some(bin.display().to_string().as_str())
        );

        assert!(!engine.record_use("missing", "x", None).unwrap());
    }

    // -- safe-bin CRUD ----------------------------------------------------

    #[test]
    fn safe_bin_mutations() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);

        assert!(engine.add_safe_bin("RipGrep").unwrap());
        assert!(engine.safe_bins().contains("ripgrep"));
        assert!(!engine.add_safe_bin("ripgrep").unwrap());

        assert!(engine.remove_safe_bin("ripgrep").unwrap());
        assert!(!engine.remove_safe_bin("ripgrep").unwrap());

        engine
            .set_safe_bins(["jq".to_string(), "YQ".to_string(), " ".to_string()])
            .unwrap();
        assert_eq!(engine.safe_bins().len(), 2);
        assert!(engine.safe_bins().contains("yq"));
    }

    // -- persistence, export/import, reset --------------------------------

    #[test]
    fn mutations_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("approvals.json");

        let mut engine = ApprovalEngine::open(store.clone());
        allowlist_mode(&mut engine);
        engine.add_allowlist("/srv/tools/**", Some("ops")).unwrap();
        engine.add_safe_bin("rg").unwrap();

        let reopened = ApprovalEngine::open(store);
        assert_eq!(reopened.policy().security, SecurityMode::Allowlist);
        assert_eq!(reopened.allowlist().len(), 1);
        assert_eq!(reopened.allowlist()[0].description.as_deref(), Some("ops"));
        assert!(reopened.safe_bins().contains("rg"));
    }

    #[test]
    fn export_import_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);
        allowlist_mode(&mut engine);
        engine.add_allowlist("/opt/**", None).unwrap();

        let exported = engine.export_config().unwrap();

        let other_dir = TempDir::new().unwrap();
        let mut other = engine_in(&other_dir);
        other.import_config(&exported).unwrap();
        assert_eq!(other.policy().security, SecurityMode::Allowlist);
        assert_eq!(other.allowlist().len(), 1);

        assert!(other.import_config("{broken").is_err());
    }

    #[test]
    fn reset_restores_defaults_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = dir.path().join("approvals.json");

        let mut engine = ApprovalEngine::open(store.clone());
        allowlist_mode(&mut engine);
        engine.add_allowlist("/opt/**", None).unwrap();
        engine.reset().unwrap();

        assert_eq!(engine.policy().security, SecurityMode::Deny);
        assert!(engine.allowlist().is_empty());

        let reopened = ApprovalEngine::open(store);
        assert_eq!(reopened.policy().security, SecurityMode::Deny);
        assert!(reopened.allowlist().is_empty());
    }

    // -- skills bypass ----------------------------------------------------

    #[test]
    fn skill_commands_bypass_gate_only_when_enabled() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_in(&dir);

        let ctx = CheckContext {
            from_skill: true,
            ..CheckContext::default()
        };
        assert!(!engine.check_approval("ls", &ctx).allowed);

        engine
            .patch_policy(&PolicyPatch {
                auto_allow_skills: Some(true),
                ..PolicyPatch::default()
            })
            .unwrap();
        let result = engine.check_approval("ls", &ctx);
        assert!(result.allowed);
        assert_eq!(result.reason, "trusted skill command");

        // Parse failure still dominates.
        assert!(!engine.check_approval("ls > f", &ctx).allowed);
    }
}
