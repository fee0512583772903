// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::gate::PermissionGate;
use crate::{Tool, ToolOutput};

/// Central registry holding all available tools.
///
/// Immutable after construction; all methods take `&self`, so one registry
/// can be shared across the session via `Arc`.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Wire-syntax table for ALL registered tools (mode-unfiltered) —
    /// the parser validates syntax regardless of mode; permission is the
    /// gate's decision afterwards.
    pub fn syntax_table(&self) -> Vec<ToolSyntax> {
        let mut table: Vec<ToolSyntax> = self.tools.values().map(|t| t.syntax()).collect();
        table.sort_by(|a, b| a.name.cmp(&b.name));
        table
    }

    /// Names of the tools callable in `mode`, per the gate.
    pub fn names_for_mode(&self, gate: &PermissionGate, mode: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .keys()
            .filter(|name| gate.check(name, mode).is_allowed())
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Render the tool documentation block for the system prompt: each tool
    /// callable in `mode`, with description and invocation template.
    pub fn prompt_docs(&self, gate: &PermissionGate, mode: &str) -> String {
        let mut docs = String::new();
        for name in self.names_for_mode(gate, mode) {
            let tool = &self.tools[&name];
            docs.push_str(&format!(
                "## {}\n{}\n\nUsage:\n{}\n\n",
                tool.name(),
                tool.description(),
                tool.syntax().usage()
            ));
        }
        docs
    }

    pub async fn execute(&self, call: &ToolCall) -> ToolOutput {
        match self.tools.get(&call.name) {
            Some(tool) => tool.execute(call).await,
            None => ToolOutput::err(format!("unknown tool: {}", call.name)),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
