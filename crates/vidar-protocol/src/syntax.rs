// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeMap;

/// A single tool invocation extracted from one assistant turn.
///
/// Parameter values are verbatim text (trimmed of the newlines that pad the
/// enclosing tags); tools that expect structured payloads parse them
/// themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl ToolCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// One documented parameter of a tool.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
}

/// The wire syntax of one tool: its tag name plus required and optional
/// parameter tags.  Drives both parser validation and the tool-use section
/// of the system prompt.
#[derive(Debug, Clone)]
pub struct ToolSyntax {
    pub name: String,
    pub required: Vec<ParamSpec>,
    pub optional: Vec<ParamSpec>,
}

impl ToolSyntax {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    pub fn required(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.required.push(ParamSpec {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.optional.push(ParamSpec {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    /// Render the invocation template shown to the model.
    pub fn usage(&self) -> String {
        let mut out = format!("<{}>\n", self.name);
        for p in &self.required {
            out.push_str(&format!("<{0}>{1}</{0}>\n", p.name, p.description));
        }
        for p in &self.optional {
            out.push_str(&format!("<{0}>{1} (optional)</{0}>\n", p.name, p.description));
        }
        out.push_str(&format!("</{}>", self.name));
        out
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
