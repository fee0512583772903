// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use tracing::debug;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::tool::{Tool, ToolOutput};

const READ_LIMIT: usize = 200_000;
const DEFAULT_LINE_LIMIT: usize = 2000;

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a file from the project. Lines in the output are numbered \
         starting at 1. Reading a file that does not exist returns an error. \
         Optionally pass a 1-indexed start line and a line limit for large \
         files; prefer reading the whole file when it fits."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("read_file")
            .required("path", "File path here")
            .optional("offset", "1-indexed line to start reading from")
            .optional("limit", "Maximum number of lines to return")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(path) = call.param("path") else {
            return ToolOutput::err("missing required parameter 'path'");
        };
        let offset = call
            .param("offset")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1);
        let limit = call
            .param("limit")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_LINE_LIMIT);

        debug!(path = %path, offset, limit, "read_file tool");

        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let capped = if text.len() > READ_LIMIT {
                    format!("{}...[file truncated at {} bytes]", &text[..READ_LIMIT], text.len())
                } else {
                    text.to_string()
                };
                if capped.is_empty() {
                    return ToolOutput::ok("File is empty.");
                }

                let start = offset.saturating_sub(1);
                let lines: Vec<&str> = capped.lines().collect();
                let total = lines.len();

                let selected: Vec<String> = lines
                    .into_iter()
                    .enumerate()
                    .skip(start)
                    .take(limit)
                    .map(|(i, line)| format!("L{}:{}", i + 1, line))
                    .collect();

                let mut content = selected.join("\n");
                let shown = limit.min(total.saturating_sub(start));
                if start + shown < total {
                    content.push_str(&format!(
                        "\n...[{} more lines, use offset={} to continue]",
                        total - start - shown,
                        start + shown + 1
                    ));
                }

                ToolOutput::ok(content)
            }
            Err(e) => ToolOutput::err(format!("read error: {e}")),
        }
    }
}
