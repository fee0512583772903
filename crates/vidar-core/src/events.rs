// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use vidar_tools::TodoItem;

/// Events emitted by the agent during a task.
/// Consumers (CLI runner, embedding frontends) subscribe to drive output.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A complete assistant message (prose and/or tool markup).
    AssistantMessage(String),
    /// A tool call passed the gate and is about to run.
    ToolCallStarted { name: String },
    /// A tool call finished; the output has been folded into history.
    ToolCallFinished { name: String, output: String, is_error: bool },
    /// The assistant message failed tool-call parsing; the reason was fed
    /// back to the model.
    ParseFailure(String),
    /// The gate denied a tool; the reason was fed back to the model.
    PermissionDenied { tool: String, mode: String, reason: String },
    /// The todo list changed.
    TodoUpdate(Vec<TodoItem>),
    /// The operating mode changed.
    ModeChanged(String),
    /// The sliding window dropped old messages.
    WindowTruncated { before: usize, after: usize },
    /// The model asked the user a question; the turn is over.
    Question(String),
    /// The model completed the task; the turn is over.
    Completed { result: String },
    /// The caller cancelled the turn.
    Aborted,
    /// The round cap was reached and the model produced a wrap-up summary.
    RoundCapReached { rounds: u32 },
}
