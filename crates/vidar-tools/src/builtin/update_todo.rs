// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::events::ToolEvent;
use crate::todo::TodoList;
use crate::tool::{Tool, ToolOutput};

/// Replaces the session's todo list from a markdown checklist.
///
/// The list handle is owned by the session and lent to this tool at
/// registration, so there is no todo state outside the task.
pub struct UpdateTodoTool {
    todos: Arc<Mutex<TodoList>>,
    event_tx: mpsc::Sender<ToolEvent>,
}

impl UpdateTodoTool {
    pub fn new(todos: Arc<Mutex<TodoList>>, event_tx: mpsc::Sender<ToolEvent>) -> Self {
        Self { todos, event_tx }
    }
}

#[async_trait]
impl Tool for UpdateTodoTool {
    fn name(&self) -> &str {
        "update_todo_list"
    }

    fn description(&self) -> &str {
        "Replace the task checklist for this session. One task per line:\n\
         - [ ] not started\n\
         - [-] in progress\n\
         - [x] completed\n\n\
         Statuses only move forward (pending -> in_progress -> completed); \
         an update that moves any task backward is rejected as a whole. \
         Update the list immediately after finishing a task, and keep at \
         most one task in progress."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("update_todo_list")
            .required("todos", "The full checklist in markdown form")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(markdown) = call.param("todos") else {
            return ToolOutput::err("missing required parameter 'todos'");
        };

        let mut todos = self.todos.lock().await;
        if let Err(e) = todos.replace_from_markdown(markdown) {
            // update did not apply; the list is unchanged
            return ToolOutput::err(format!("todo update rejected: {e}"));
        }

        debug!(count = todos.len(), "update_todo_list tool");

        let items = todos.items().to_vec();
        drop(todos);
        let _ = self.event_tx.send(ToolEvent::TodoUpdate(items.clone())).await;

        let done = items.iter().filter(|t| t.status == crate::TodoStatus::Completed).count();
        ToolOutput::ok(format!("Todo list updated: {done}/{} completed", items.len()))
    }
}
