// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use tracing::debug;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::tool::{Tool, ToolOutput};

/// Relay a clarifying question to the user.  The agent loop ends the turn
/// after this tool; the user's answer arrives as the next user message.
pub struct AskFollowupTool;

#[async_trait]
impl Tool for AskFollowupTool {
    fn name(&self) -> &str {
        "ask_followup_question"
    }

    fn description(&self) -> &str {
        "Ask the user one specific question when a genuinely blocking \
         ambiguity cannot be resolved from the project itself. Prefer \
         finding the answer with the other tools; every question costs a \
         round-trip."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("ask_followup_question")
            .required("question", "A clear, specific question")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(question) = call.param("question") else {
            return ToolOutput::err("missing required parameter 'question'");
        };
        debug!(question = %question, "ask_followup_question tool");
        ToolOutput::ok(format!("Question relayed to the user: {question}"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[tokio::test]
    async fn relays_the_question() {
        let mut params = BTreeMap::new();
        params.insert("question".to_string(), "Which database?".to_string());
        let out = AskFollowupTool
            .execute(&ToolCall { name: "ask_followup_question".into(), params })
            .await;
        assert!(!out.is_error);
        assert!(out.content.contains("Which database?"));
    }

    #[tokio::test]
    async fn missing_question_is_error() {
        let out = AskFollowupTool
            .execute(&ToolCall { name: "ask_followup_question".into(), params: BTreeMap::new() })
            .await;
        assert!(out.is_error);
    }
}
