// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::{BTreeMap, HashMap};

use crate::{ToolCall, ToolSyntax};

/// Failures while extracting a tool call from one assistant turn.
///
/// All variants are recoverable: the orchestrator folds them back into the
/// conversation as corrective tool-result messages rather than aborting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(
        "no tool call found in the assistant message; \
         respond with exactly one tool invocation in XML tags"
    )]
    NoToolCall,
    #[error("expected exactly one tool call per message, found {count}")]
    MultipleToolCalls { count: usize },
    #[error("tool tag <{tag}> is never closed")]
    UnclosedTag { tag: String },
    #[error("tool '{tool}' is missing required parameter '{param}'")]
    MissingParameter { tool: String, param: String },
}

/// Extracts structured tool invocations from raw assistant text.
///
/// The wire convention: one top-level XML-style block whose tag is the tool
/// name and whose child tags are parameter name/value pairs.  Values may
/// span multiple lines.  Syntactic well-formedness is validated here;
/// whether the tool may run in the current mode is the permission gate's
/// decision, so unknown tool names pass through untouched.
///
/// A top-level block is closed by the *first* occurrence of its closing
/// tag: a parameter value that embeds the tool's own closing tag terminates
/// the block early.  Parameter tags close on their *last* occurrence within
/// the block, so bodies may quote parameter markup freely.
pub struct ToolCallParser {
    syntax: HashMap<String, ToolSyntax>,
}

impl ToolCallParser {
    pub fn new(table: impl IntoIterator<Item = ToolSyntax>) -> Self {
        Self {
            syntax: table.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }

    /// Parse one assistant turn into exactly one [`ToolCall`].
    pub fn parse(&self, text: &str) -> Result<ToolCall, ParseError> {
        let text = strip_thinking(text);
        let spans = self.top_level_spans(&text)?;

        match spans.len() {
            0 => Err(ParseError::NoToolCall),
            1 => {
                let (name, inner) = &spans[0];
                let params = parse_params(inner);
                if let Some(syntax) = self.syntax.get(name.as_str()) {
                    for p in &syntax.required {
                        if !params.contains_key(&p.name) {
                            return Err(ParseError::MissingParameter {
                                tool: name.clone(),
                                param: p.name.clone(),
                            });
                        }
                    }
                }
                Ok(ToolCall { name: name.clone(), params })
            }
            count => Err(ParseError::MultipleToolCalls { count }),
        }
    }

    /// Collect top-level `(tag, inner)` spans, left to right.
    ///
    /// A candidate opening tag must sit at the start of a line — inline
    /// markup inside prose is never a tool call.  An opening tag with no
    /// close is an error only when the tag names a known tool; stray
    /// unclosed markup is ignored.
    fn top_level_spans(&self, text: &str) -> Result<Vec<(String, String)>, ParseError> {
        let bytes = text.as_bytes();
        let mut spans = Vec::new();
        let mut pos = 0;

        while let Some(open_rel) = text[pos..].find('<') {
            let open = pos + open_rel;
            let at_line_start = open == 0 || bytes[open - 1] == b'\n';
            let Some(tag) = tag_name_at(bytes, open) else {
                pos = open + 1;
                continue;
            };
            if !at_line_start {
                pos = open + 1;
                continue;
            }
            let body_start = open + tag.len() + 2; // past "<tag>"
            let close_marker = format!("</{tag}>");
            match text[body_start..].find(&close_marker) {
                Some(rel) => {
                    let inner = &text[body_start..body_start + rel];
                    spans.push((tag, inner.to_string()));
                    pos = body_start + rel + close_marker.len();
                }
                None => {
                    if self.syntax.contains_key(&tag) {
                        return Err(ParseError::UnclosedTag { tag });
                    }
                    pos = open + 1;
                }
            }
        }

        Ok(spans)
    }
}

/// Parse `<name>value</name>` children of a tool block into a map.
///
/// The value runs to the *last* matching close tag after the opening, so
/// bodies may embed their own closing markup (a file that documents the
/// tag syntax, say).  A single newline on each side is stripped so
/// `<path>\na.txt\n</path>` and `<path>a.txt</path>` read the same.
fn parse_params(inner: &str) -> BTreeMap<String, String> {
    let bytes = inner.as_bytes();
    let mut params = BTreeMap::new();
    let mut pos = 0;

    while let Some(open_rel) = inner[pos..].find('<') {
        let open = pos + open_rel;
        let Some(tag) = tag_name_at(bytes, open) else {
            pos = open + 1;
            continue;
        };
        let body_start = open + tag.len() + 2;
        let close_marker = format!("</{tag}>");
        match inner[body_start..].rfind(&close_marker) {
            Some(rel) => {
                let raw = &inner[body_start..body_start + rel];
                params.insert(tag, trim_edge_newlines(raw).to_string());
                pos = body_start + rel + close_marker.len();
            }
            None => pos = open + 1,
        }
    }

    params
}

/// Return the identifier immediately after `<` at `open`, if it is
/// followed by `>`.  Identifiers are `[a-z_][a-z0-9_]*`.
fn tag_name_at(bytes: &[u8], open: usize) -> Option<String> {
    let mut i = open + 1;
    let first = *bytes.get(i)?;
    if !(first.is_ascii_lowercase() || first == b'_') {
        return None;
    }
    while i < bytes.len()
        && (bytes[i].is_ascii_lowercase() || bytes[i].is_ascii_digit() || bytes[i] == b'_')
    {
        i += 1;
    }
    if bytes.get(i) == Some(&b'>') {
        Some(String::from_utf8_lossy(&bytes[open + 1..i]).into_owned())
    } else {
        None
    }
}

/// Drop at most one leading and one trailing newline.
fn trim_edge_newlines(s: &str) -> &str {
    let s = s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n')).unwrap_or(s);
    s.strip_suffix("\r\n").or_else(|| s.strip_suffix('\n')).unwrap_or(s)
}

/// Remove `<thinking>…</thinking>` sections before scanning for tool tags.
/// An unterminated thinking block is stripped to the end of the text.
fn strip_thinking(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<thinking>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</thinking>") {
            Some(rel) => rest = &rest[start + rel + "</thinking>".len()..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
