// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;

use regex::Regex;

use vidar_config::ModeDef;

/// Outcome of a permission check.  Denials carry a human-readable reason
/// that the orchestrator folds back to the model as a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Allowed => None,
            Decision::Denied { reason } => Some(reason),
        }
    }
}

/// Decides whether a tool may run in the current operating mode.
///
/// The resolution chain is flat, not inherited: capability gap → custom
/// deny-list → custom allow-list → built-in table → default-allow.  An
/// unknown mode slug allows everything — the escape hatch for experimental
/// modes that exist only in configuration.
///
/// Decisions are pure functions of the inputs and the tables held here;
/// there is no other state.
#[derive(Debug, Default)]
pub struct PermissionGate {
    custom_modes: Vec<ModeDef>,
    /// Tools whose capability requirement is unmet, keyed by tool name,
    /// with the reason shown on denial (e.g. a missing API key).
    unavailable: HashMap<String, String>,
}

impl PermissionGate {
    pub fn new(custom_modes: Vec<ModeDef>) -> Self {
        Self { custom_modes, unavailable: HashMap::new() }
    }

    /// Mark a tool as unavailable regardless of mode.
    pub fn with_unavailable(mut self, tool: impl Into<String>, reason: impl Into<String>) -> Self {
        self.unavailable.insert(tool.into(), reason.into());
        self
    }

    pub fn check(&self, tool: &str, mode_slug: &str) -> Decision {
        if let Some(reason) = self.unavailable.get(tool) {
            return Decision::Denied {
                reason: format!("tool '{tool}' is unavailable: {reason}"),
            };
        }

        if let Some(custom) = self.custom_modes.iter().find(|m| m.slug == mode_slug) {
            if let Some(denied) = &custom.denied_tools {
                if denied.iter().any(|t| t == tool) {
                    return self.denied(tool, mode_slug);
                }
            }
            if let Some(allowed) = &custom.allowed_tools {
                return if allowed.iter().any(|t| t == tool) {
                    Decision::Allowed
                } else {
                    self.denied(tool, mode_slug)
                };
            }
        }

        if builtin_allows(mode_slug, tool) {
            Decision::Allowed
        } else {
            self.denied(tool, mode_slug)
        }
    }

    fn denied(&self, tool: &str, mode_slug: &str) -> Decision {
        Decision::Denied {
            reason: format!("tool '{tool}' is not allowed in '{mode_slug}' mode"),
        }
    }
}

/// Tools callable in read-only discussion mode.
const ASK_TOOLS: &[&str] = &[
    "read_file",
    "search_files",
    "list_files",
    "ask_followup_question",
    "attempt_completion",
    "switch_mode",
];

/// Tools callable while designing: the read-only set plus task planning.
const ARCHITECT_TOOLS: &[&str] = &[
    "read_file",
    "search_files",
    "list_files",
    "ask_followup_question",
    "attempt_completion",
    "switch_mode",
    "update_todo_list",
];

/// The static built-in mode → tool-set table.  `code` allows every tool;
/// unknown slugs default to allow-all.
fn builtin_allows(mode_slug: &str, tool: &str) -> bool {
    match mode_slug {
        "code" => true,
        "architect" => ARCHITECT_TOOLS.contains(&tool),
        "ask" => ASK_TOOLS.contains(&tool),
        _ => true,
    }
}

// ─── Shell command policy ─────────────────────────────────────────────────────

/// What to do with one shell command before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandDecision {
    /// Run without asking.
    Run,
    /// Ask the user-interaction collaborator first.
    Confirm,
    /// Refuse outright.
    Forbid,
}

/// Maps a shell command string to a [`CommandDecision`] using the
/// configured glob patterns.  Deny patterns always win over auto-approve.
#[derive(Debug)]
pub struct CommandPolicy {
    auto_patterns: Vec<Regex>,
    deny_patterns: Vec<Regex>,
}

impl CommandPolicy {
    pub fn new(auto: &[String], deny: &[String]) -> Self {
        let compile = |patterns: &[String]| -> Vec<Regex> {
            patterns.iter().filter_map(|p| glob_to_regex(p)).collect()
        };
        Self {
            auto_patterns: compile(auto),
            deny_patterns: compile(deny),
        }
    }

    pub fn from_config(cfg: &vidar_config::ToolsConfig) -> Self {
        Self::new(&cfg.auto_approve_patterns, &cfg.deny_patterns)
    }

    pub fn decide(&self, command: &str) -> CommandDecision {
        if self.deny_patterns.iter().any(|re| re.is_match(command)) {
            return CommandDecision::Forbid;
        }
        if self.auto_patterns.iter().any(|re| re.is_match(command)) {
            return CommandDecision::Run;
        }
        CommandDecision::Confirm
    }
}

/// Convert a simple shell glob pattern to a [`Regex`].
/// Only `*` (match anything) and `?` (match one char) are supported.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(slug: &str, allowed: Option<&[&str]>, denied: Option<&[&str]>) -> ModeDef {
        ModeDef {
            slug: slug.into(),
            name: None,
            allowed_tools: allowed.map(|l| l.iter().map(|s| s.to_string()).collect()),
            denied_tools: denied.map(|l| l.iter().map(|s| s.to_string()).collect()),
        }
    }

    // ── Built-in table ────────────────────────────────────────────────────────

    #[test]
    fn ask_mode_always_denies_execute_command() {
        let gate = PermissionGate::new(vec![]);
        let d = gate.check("execute_command", "ask");
        assert!(!d.is_allowed());
        assert!(d.reason().unwrap().contains("execute_command"));
        assert!(d.reason().unwrap().contains("ask"));
    }

    #[test]
    fn code_mode_always_allows_read_file() {
        let gate = PermissionGate::new(vec![]);
        assert!(gate.check("read_file", "code").is_allowed());
    }

    #[test]
    fn code_mode_allows_everything() {
        let gate = PermissionGate::new(vec![]);
        for tool in ["execute_command", "write_to_file", "apply_diff", "mystery_tool"] {
            assert!(gate.check(tool, "code").is_allowed(), "{tool}");
        }
    }

    #[test]
    fn architect_mode_allows_todo_but_denies_writes() {
        let gate = PermissionGate::new(vec![]);
        assert!(gate.check("update_todo_list", "architect").is_allowed());
        assert!(!gate.check("write_to_file", "architect").is_allowed());
        assert!(!gate.check("apply_diff", "architect").is_allowed());
    }

    #[test]
    fn ask_mode_allows_reading_and_answering() {
        let gate = PermissionGate::new(vec![]);
        assert!(gate.check("read_file", "ask").is_allowed());
        assert!(gate.check("attempt_completion", "ask").is_allowed());
        assert!(!gate.check("update_todo_list", "ask").is_allowed());
    }

    #[test]
    fn unknown_mode_slug_defaults_to_allow_all() {
        let gate = PermissionGate::new(vec![]);
        assert!(gate.check("execute_command", "experimental").is_allowed());
    }

    // ── Custom modes ──────────────────────────────────────────────────────────

    #[test]
    fn custom_deny_list_wins_over_everything() {
        let gate = PermissionGate::new(vec![mode(
            "reviewer",
            Some(&["execute_command", "read_file"]),
            Some(&["execute_command"]),
        )]);
        assert!(!gate.check("execute_command", "reviewer").is_allowed());
        assert!(gate.check("read_file", "reviewer").is_allowed());
    }

    #[test]
    fn custom_deny_applies_even_without_allow_list() {
        let gate =
            PermissionGate::new(vec![mode("loose", None, Some(&["execute_command"]))]);
        assert!(!gate.check("execute_command", "loose").is_allowed());
        // No allow-list and not denied → falls through to built-in table
        // (unknown slug → allow-all)
        assert!(gate.check("write_to_file", "loose").is_allowed());
    }

    #[test]
    fn custom_allow_list_is_exact() {
        let gate = PermissionGate::new(vec![mode("docs", Some(&["read_file"]), None)]);
        assert!(gate.check("read_file", "docs").is_allowed());
        assert!(!gate.check("write_to_file", "docs").is_allowed());
    }

    #[test]
    fn custom_mode_can_tighten_a_builtin_slug() {
        let gate = PermissionGate::new(vec![mode("code", None, Some(&["execute_command"]))]);
        assert!(!gate.check("execute_command", "code").is_allowed());
        assert!(gate.check("read_file", "code").is_allowed());
    }

    // ── Capability requirements ───────────────────────────────────────────────

    #[test]
    fn unavailable_tool_is_denied_with_reason_in_any_mode() {
        let gate = PermissionGate::new(vec![])
            .with_unavailable("search_files", "search backend not configured");
        let d = gate.check("search_files", "code");
        assert!(!d.is_allowed());
        assert!(d.reason().unwrap().contains("not configured"));
    }

    // ── Command policy ────────────────────────────────────────────────────────

    fn policy(auto: &[&str], deny: &[&str]) -> CommandPolicy {
        CommandPolicy::new(
            &auto.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            &deny.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn deny_beats_auto_for_same_pattern() {
        let p = policy(&["rm *"], &["rm *"]);
        assert_eq!(p.decide("rm /tmp/foo"), CommandDecision::Forbid);
    }

    #[test]
    fn auto_approve_wildcard_prefix() {
        let p = policy(&["cat *"], &[]);
        assert_eq!(p.decide("cat /etc/hosts"), CommandDecision::Run);
    }

    #[test]
    fn question_mark_matches_exactly_one_char() {
        let p = policy(&["ls ?"], &[]);
        assert_eq!(p.decide("ls -"), CommandDecision::Run);
        assert_eq!(p.decide("ls --"), CommandDecision::Confirm);
    }

    #[test]
    fn unknown_command_requires_confirmation() {
        let p = policy(&["cat *"], &["rm -rf /*"]);
        assert_eq!(p.decide("git commit -m test"), CommandDecision::Confirm);
    }

    #[test]
    fn default_config_auto_approves_reads() {
        let p = CommandPolicy::from_config(&vidar_config::ToolsConfig::default());
        assert_eq!(p.decide("cat README.md"), CommandDecision::Run);
        assert_eq!(p.decide("cargo build"), CommandDecision::Confirm);
    }
}
