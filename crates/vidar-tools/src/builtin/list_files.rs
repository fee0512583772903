// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::tool::{Tool, ToolOutput};

const DEFAULT_DEPTH: usize = 2;
const MAX_DEPTH: usize = 5;
const DEFAULT_LIMIT: usize = 200;

pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List files and directories under a path. depth: default 2, max 5. \
         Directories carry a trailing /. Excludes .git/ target/ \
         node_modules/. For content search use search_files."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("list_files")
            .required("path", "Directory path here")
            .optional("depth", "Maximum recursion depth")
            .optional("limit", "Maximum entries to return")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(path) = call.param("path") else {
            return ToolOutput::err("missing required parameter 'path'");
        };
        let depth = call
            .param("depth")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_DEPTH)
            .min(MAX_DEPTH);
        let limit = call
            .param("limit")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_LIMIT);

        debug!(path = %path, depth, limit, "list_files tool");

        match tokio::fs::metadata(path).await {
            Ok(m) if m.is_dir() => {}
            Ok(_) => return ToolOutput::err(format!("not a directory: {path}")),
            Err(e) => return ToolOutput::err(format!("cannot access {path}: {e}")),
        }

        let mut entries: Vec<String> = Vec::new();
        let mut truncated = false;

        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded(e.file_name().to_str().unwrap_or("")))
            .filter_map(Result::ok)
        {
            if entries.len() >= limit {
                truncated = true;
                break;
            }
            let rel = entry
                .path()
                .strip_prefix(path)
                .unwrap_or(entry.path())
                .display()
                .to_string();
            if entry.file_type().is_dir() {
                entries.push(format!("{rel}/"));
            } else {
                entries.push(rel);
            }
        }

        if entries.is_empty() {
            return ToolOutput::ok("(empty directory)");
        }
        let mut output = entries.join("\n");
        if truncated {
            output.push_str(&format!("\n...[output truncated at {limit} entries]"));
        }
        ToolOutput::ok(output)
    }
}

static EXCLUDED_DIRS: &[&str] = &[".git", "target", "node_modules", "__pycache__"];

fn is_excluded(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}
