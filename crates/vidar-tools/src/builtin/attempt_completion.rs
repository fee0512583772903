// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use tracing::debug;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::tool::{Tool, ToolOutput};

/// The completion signal: presents the final result and ends the loop.
/// The todo completion gate (when enabled) is enforced by the agent before
/// the turn is accepted as terminal.
pub struct AttemptCompletionTool;

#[async_trait]
impl Tool for AttemptCompletionTool {
    fn name(&self) -> &str {
        "attempt_completion"
    }

    fn description(&self) -> &str {
        "Present the final result of the task to the user. Only call this \
         once the task is actually done — not to report progress. The \
         result should stand on its own, without questions or offers of \
         further help."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("attempt_completion")
            .required("result", "The final result of the task")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(result) = call.param("result") else {
            return ToolOutput::err("missing required parameter 'result'");
        };
        debug!(len = result.len(), "attempt_completion tool");
        ToolOutput::ok(result)
    }
}
