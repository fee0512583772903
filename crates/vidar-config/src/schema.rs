// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Top-level configuration, merged from layered TOML files by [`crate::load`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub window: WindowConfig,
    /// User-defined modes.  A custom mode whose slug collides with a
    /// built-in one overrides the built-in permission table for that slug.
    #[serde(default)]
    pub modes: Vec<ModeDef>,
}

fn default_mode_slug() -> String {
    "code".into()
}
fn default_max_tool_rounds() -> u32 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Mode the session starts in when none is given on the CLI.
    #[serde(default = "default_mode_slug")]
    pub default_mode: String,
    /// Maximum number of model→tool rounds before the loop stops.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    /// When true, `attempt_completion` is rejected while any todo item is
    /// not completed.
    #[serde(default)]
    pub enforce_todo_completion: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode_slug(),
            max_tool_rounds: default_max_tool_rounds(),
            enforce_todo_completion: false,
        }
    }
}

fn default_token_budget() -> usize {
    120_000
}
fn default_trigger_fraction() -> f32 {
    0.9
}
fn default_frac_to_remove() -> f64 {
    0.5
}

/// Conversation sliding-window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Approximate token budget for the whole message list (chars/4 estimate).
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,
    /// Fraction of the budget at which truncation triggers (0.0–1.0).
    #[serde(default = "default_trigger_fraction")]
    pub trigger_fraction: f32,
    /// Fraction of eligible messages removed per truncation pass.
    /// Rounded down to an even count so complete exchange pairs are cut.
    #[serde(default = "default_frac_to_remove")]
    pub frac_to_remove: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            trigger_fraction: default_trigger_fraction(),
            frac_to_remove: default_frac_to_remove(),
        }
    }
}

fn default_command_timeout() -> u64 {
    30
}
fn default_result_char_cap() -> usize {
    20_000
}
fn default_auto_patterns() -> Vec<String> {
    ["cat *", "ls*", "head *", "tail *", "git status*", "git diff*", "git log*"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Shell commands matching these glob patterns run without asking.
    #[serde(default = "default_auto_patterns")]
    pub auto_approve_patterns: Vec<String>,
    /// Shell commands matching these glob patterns are refused outright.
    #[serde(default)]
    pub deny_patterns: Vec<String>,
    /// Timeout in seconds for a single `execute_command` invocation.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    /// Character cap applied to a single tool result before it enters the
    /// conversation.  0 disables capping.
    #[serde(default = "default_result_char_cap")]
    pub result_char_cap: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            auto_approve_patterns: default_auto_patterns(),
            deny_patterns: Vec::new(),
            command_timeout_secs: default_command_timeout(),
            result_char_cap: default_result_char_cap(),
        }
    }
}

/// A named permission profile restricting which tools are callable.
///
/// `denied_tools` takes precedence over `allowed_tools`; when both are
/// absent the built-in table for the slug applies, and unknown slugs
/// default to allow-all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeDef {
    pub slug: String,
    /// Display name; defaults to the slug when omitted.
    #[serde(default)]
    pub name: Option<String>,
    /// Exact allow-list.  `None` means "no restriction from this list".
    #[serde(default)]
    pub allowed_tools: Option<Vec<String>>,
    /// Deny-list; presence of a tool here always wins.
    #[serde(default)]
    pub denied_tools: Option<Vec<String>>,
}

impl ModeDef {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: None,
            allowed_tools: None,
            denied_tools: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.slug)
    }
}

/// Built-in mode slugs, in the order they are presented to the model.
pub fn builtin_mode_slugs() -> &'static [&'static str] {
    &["code", "architect", "ask"]
}

/// Look up a built-in mode definition by slug.
pub fn builtin_mode(slug: &str) -> Option<ModeDef> {
    match slug {
        "code" => Some(ModeDef {
            slug: "code".into(),
            name: Some("Code".into()),
            allowed_tools: None,
            denied_tools: None,
        }),
        "architect" => Some(ModeDef {
            slug: "architect".into(),
            name: Some("Architect".into()),
            allowed_tools: None,
            denied_tools: None,
        }),
        "ask" => Some(ModeDef {
            slug: "ask".into(),
            name: Some("Ask".into()),
            allowed_tools: None,
            denied_tools: None,
        }),
        _ => None,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
