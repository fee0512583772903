// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use regex::RegexBuilder;
use tracing::debug;
use walkdir::WalkDir;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::tool::{Tool, ToolOutput};

const DEFAULT_MATCH_LIMIT: usize = 100;
const MAX_SCAN_BYTES: u64 = 1_000_000;

pub struct SearchFilesTool;

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Search file contents under a directory with a regular expression \
         (e.g. 'fn\\s+\\w+', 'log.*Error'). Matches are reported as \
         path:line:text. Binary and oversized files are skipped, as are \
         .git/ target/ node_modules/. Results are capped; tighten the \
         pattern to see more."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("search_files")
            .required("path", "Directory to search")
            .required("regex", "Regular expression pattern")
            .optional("case_sensitive", "true (default) or false")
            .optional("limit", "Maximum matches to return")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(path) = call.param("path") else {
            return ToolOutput::err("missing required parameter 'path'");
        };
        let Some(pattern) = call.param("regex") else {
            return ToolOutput::err("missing required parameter 'regex'");
        };
        let case_sensitive = call
            .param("case_sensitive")
            .map(|v| v != "false")
            .unwrap_or(true);
        let limit = call
            .param("limit")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MATCH_LIMIT);

        debug!(path = %path, pattern = %pattern, "search_files tool");

        let re = match RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
        {
            Ok(re) => re,
            Err(e) => return ToolOutput::err(format!("invalid regex: {e}")),
        };

        let mut matches: Vec<String> = Vec::new();
        let mut truncated = false;

        'files: for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded(e.file_name().to_str().unwrap_or("")))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            if entry.metadata().map(|m| m.len() > MAX_SCAN_BYTES).unwrap_or(true) {
                continue;
            }
            let Ok(text) = std::fs::read_to_string(entry.path()) else {
                continue; // binary or unreadable
            };
            for (i, line) in text.lines().enumerate() {
                if re.is_match(line) {
                    if matches.len() >= limit {
                        truncated = true;
                        break 'files;
                    }
                    matches.push(format!("{}:{}:{}", entry.path().display(), i + 1, line));
                }
            }
        }

        if matches.is_empty() {
            return ToolOutput::ok("(no matches)");
        }
        let mut output = matches.join("\n");
        if truncated {
            output.push_str(&format!(
                "\n...[more matches omitted after {limit}; use a more specific pattern]"
            ));
        }
        ToolOutput::ok(output)
    }
}

static EXCLUDED_DIRS: &[&str] = &[".git", "target", "node_modules", "__pycache__"];

fn is_excluded(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}
