// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::batch::ApprovalHandler;
use crate::gate::{CommandDecision, CommandPolicy};
use crate::tool::{Tool, ToolOutput};

const OUTPUT_CAP_BYTES: usize = 20_000;
const HEAD_LINES: usize = 100;
const TAIL_LINES: usize = 100;

pub struct ExecuteCommandTool {
    policy: CommandPolicy,
    approval: Arc<dyn ApprovalHandler>,
    pub timeout_secs: u64,
}

impl ExecuteCommandTool {
    pub fn new(policy: CommandPolicy, approval: Arc<dyn ApprovalHandler>, timeout_secs: u64) -> Self {
        Self { policy, approval, timeout_secs }
    }
}

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Run a shell command (sh -c) and return its output. Use for builds, \
         tests, and git — never for file I/O, which has dedicated tools. \
         Chain dependent commands with &&. Output is capped with the first \
         and last lines preserved so trailing errors are never lost. \
         Commands matching the deny policy are refused; unrecognized \
         commands require user confirmation."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("execute_command")
            .required("command", "The shell command to execute")
            .optional("cwd", "Working directory (defaults to the current one)")
            .optional("timeout_secs", "Execution timeout in seconds")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(command) = call.param("command") else {
            return ToolOutput::err("missing required parameter 'command'");
        };
        let cwd = call.param("cwd");
        let timeout = call
            .param("timeout_secs")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(self.timeout_secs);

        match self.policy.decide(command) {
            CommandDecision::Forbid => {
                return ToolOutput::err(format!("command blocked by policy: {command}"));
            }
            CommandDecision::Confirm => {
                if !self.approval.approve_command(command).await {
                    return ToolOutput::err(format!("user declined to run: {command}"));
                }
            }
            CommandDecision::Run => {}
        }

        debug!(cmd = %command, "execute_command tool");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let result =
            tokio::time::timeout(std::time::Duration::from_secs(timeout), cmd.output()).await;

        match result {
            Ok(Ok(output)) => {
                let mut content = String::new();
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);

                if !stdout.is_empty() {
                    content.push_str(&head_tail_truncate(&stdout));
                }
                if !stderr.is_empty() {
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    content.push_str("[stderr]\n");
                    content.push_str(&head_tail_truncate(&stderr));
                }
                if content.is_empty() {
                    content = format!("[exit {}]", output.status.code().unwrap_or(-1));
                }

                if output.status.success() {
                    ToolOutput::ok(content)
                } else {
                    let code = output.status.code().unwrap_or(-1);
                    ToolOutput::err(format!("[exit {code}]\n{content}"))
                }
            }
            Ok(Err(e)) => ToolOutput::err(format!("spawn error: {e}")),
            Err(_) => ToolOutput::err(format!("timeout after {timeout}s")),
        }
    }
}

/// Cap output at ~20 KB keeping the first and last 100 lines, so both the
/// preamble and the final error are visible.
fn head_tail_truncate(text: &str) -> String {
    if text.len() <= OUTPUT_CAP_BYTES {
        return text.to_string();
    }
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= HEAD_LINES + TAIL_LINES {
        return text.to_string();
    }
    let omitted = lines.len() - HEAD_LINES - TAIL_LINES;
    format!(
        "{}\n[... {omitted} lines omitted ...]\n{}",
        lines[..HEAD_LINES].join("\n"),
        lines[lines.len() - TAIL_LINES..].join("\n")
    )
}
