// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use vidar_config::Config;
use vidar_model::{CompletionRequest, Message, ModelProvider};
use vidar_protocol::ToolCallParser;
use vidar_tools::{events::ToolEvent, Decision, PermissionGate, TodoStatus, ToolRegistry};

use crate::events::AgentEvent;
use crate::prompts::system_prompt;
use crate::session::Session;
use crate::window::truncate_messages;

/// The orchestration core: drives the model ↔ tool loop for one session.
///
/// Strictly turn-based — exactly one tool call is in flight at a time, and
/// the model is not prompted again until the previous result (success,
/// denial, parse failure, or error) has been folded back into the
/// conversation as a tool message.
pub struct Agent {
    session: Session,
    registry: Arc<ToolRegistry>,
    provider: Arc<dyn ModelProvider>,
    gate: PermissionGate,
    config: Arc<Config>,
    /// Receives `ToolEvent`s emitted by stateful tools (todo updates, mode
    /// changes).  The paired sender is held by `UpdateTodoTool` /
    /// `SwitchModeTool` inside the registry.
    tool_event_rx: mpsc::Receiver<ToolEvent>,
    custom_instructions: Option<String>,
}

impl Agent {
    /// Construct an agent.
    ///
    /// `session` must be the same [`Session`] whose `mode` and `todos`
    /// handles were given to any `SwitchModeTool` / `UpdateTodoTool` in
    /// `registry`, so tool-driven state changes are visible to the loop.
    /// `tool_event_rx` must be the receiving end of the channel whose
    /// sender those tools hold.
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        registry: Arc<ToolRegistry>,
        gate: PermissionGate,
        config: Arc<Config>,
        session: Session,
        tool_event_rx: mpsc::Receiver<ToolEvent>,
    ) -> Self {
        Self {
            session,
            registry,
            provider,
            gate,
            config,
            tool_event_rx,
            custom_instructions: None,
        }
    }

    /// Append free-form text to the system prompt.
    pub fn with_custom_instructions(mut self, text: impl Into<String>) -> Self {
        self.custom_instructions = Some(text.into());
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Push a user message and run the loop, streaming events through `tx`.
    pub async fn submit(
        &mut self,
        user_input: &str,
        tx: mpsc::Sender<AgentEvent>,
    ) -> anyhow::Result<()> {
        // The guard keeps the dummy cancel channel open for the whole call.
        let (_guard, mut cancel) = oneshot::channel::<()>();
        self.submit_inner(user_input, tx, &mut cancel).await
    }

    /// Like [`submit`] but accepts a cancellation channel.
    ///
    /// When the sender half sends `()` (or is dropped) the in-flight model
    /// or tool call is abandoned at the next await point and
    /// `AgentEvent::Aborted` is emitted — cancellation is a terminal result
    /// for the turn, never a silent drop.  If `cancel` is already resolved
    /// on entry the submit is skipped entirely.
    pub async fn submit_with_cancel(
        &mut self,
        user_input: &str,
        tx: mpsc::Sender<AgentEvent>,
        mut cancel: oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        self.submit_inner(user_input, tx, &mut cancel).await
    }

    async fn submit_inner(
        &mut self,
        user_input: &str,
        tx: mpsc::Sender<AgentEvent>,
        cancel: &mut oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        if cancelled(cancel) {
            let _ = tx.send(AgentEvent::Aborted).await;
            return Ok(());
        }

        // Inject the system message on the first turn of the task.
        if self.session.messages.is_empty() {
            let mode = self.session.mode.lock().await.clone();
            let docs = self.registry.prompt_docs(&self.gate, &mode);
            self.session.push(Message::system(system_prompt(
                &mode,
                &docs,
                self.custom_instructions.as_deref(),
            )));
        }
        self.session.push(Message::user(user_input));

        self.run_loop(tx, cancel).await
    }

    /// The main loop: model call → parse → gate → dispatch → fold result.
    async fn run_loop(
        &mut self,
        tx: mpsc::Sender<AgentEvent>,
        cancel: &mut oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        let parser = ToolCallParser::new(self.registry.syntax_table());
        let max_rounds = self.config.agent.max_tool_rounds;
        let mut rounds = 0u32;

        loop {
            if cancelled(cancel) {
                let _ = tx.send(AgentEvent::Aborted).await;
                return Ok(());
            }

            rounds += 1;
            if rounds > max_rounds {
                self.wrap_up_turn(&tx, max_rounds).await;
                break;
            }

            self.enforce_window(&tx).await;

            let mode = self.session.mode.lock().await.clone();
            let req = CompletionRequest {
                messages: self.session.messages.clone(),
                tool_docs: Some(self.registry.prompt_docs(&self.gate, &mode)),
            };

            let turn = tokio::select! {
                biased;
                _ = &mut *cancel => None,
                result = self.provider.complete(req) => Some(result),
            };
            let assistant = match turn {
                None => {
                    let _ = tx.send(AgentEvent::Aborted).await;
                    return Ok(());
                }
                Some(result) => result.context("model completion failed")?,
            };

            self.session.push(Message::assistant(&assistant));
            let _ = tx.send(AgentEvent::AssistantMessage(assistant.clone())).await;

            // Exactly one well-formed tool call per assistant turn; anything
            // else goes back to the model as a corrective tool message.
            let call = match parser.parse(&assistant) {
                Ok(call) => call,
                Err(e) => {
                    debug!(error = %e, "tool call parse failure");
                    self.session.push(Message::tool(format!("[protocol] Error: {e}")));
                    let _ = tx.send(AgentEvent::ParseFailure(e.to_string())).await;
                    continue;
                }
            };

            if let Decision::Denied { reason } = self.gate.check(&call.name, &mode) {
                debug!(tool = %call.name, mode = %mode, "permission denied");
                self.session
                    .push(Message::tool(format!("[{}] Error: {reason}", call.name)));
                let _ = tx
                    .send(AgentEvent::PermissionDenied {
                        tool: call.name.clone(),
                        mode: mode.clone(),
                        reason,
                    })
                    .await;
                continue;
            }

            if call.name == "attempt_completion" {
                if let Some(open) = self.open_todo_count().await {
                    self.session.push(Message::tool(format!(
                        "[attempt_completion] Error: {open} todo item(s) are not \
                         completed; finish the work or update the list first"
                    )));
                    continue;
                }
                let out = self.registry.execute(&call).await;
                if out.is_error {
                    self.session
                        .push(Message::tool(format!("[{}] Error: {}", call.name, out.content)));
                    continue;
                }
                let _ = tx.send(AgentEvent::Completed { result: out.content }).await;
                break;
            }

            let _ = tx.send(AgentEvent::ToolCallStarted { name: call.name.clone() }).await;

            let executed = tokio::select! {
                biased;
                _ = &mut *cancel => None,
                out = self.registry.execute(&call) => Some(out),
            };
            let out = match executed {
                None => {
                    let _ = tx.send(AgentEvent::Aborted).await;
                    return Ok(());
                }
                Some(out) => out,
            };

            self.drain_tool_events(&tx).await;

            let prefix = if out.is_error { "Error" } else { "Result" };
            let capped = cap_result(&out.content, self.config.tools.result_char_cap);
            self.session
                .push(Message::tool(format!("[{}] {prefix}:\n{capped}", call.name)));
            let _ = tx
                .send(AgentEvent::ToolCallFinished {
                    name: call.name.clone(),
                    output: out.content.clone(),
                    is_error: out.is_error,
                })
                .await;

            // A successful question hands the turn back to the user.
            if call.name == "ask_followup_question" && !out.is_error {
                let question = call.param("question").unwrap_or_default().to_string();
                let _ = tx.send(AgentEvent::Question(question)).await;
                break;
            }
        }

        Ok(())
    }

    /// Number of open todo items when the completion gate applies;
    /// `None` when completion may proceed.
    async fn open_todo_count(&self) -> Option<usize> {
        if !self.config.agent.enforce_todo_completion {
            return None;
        }
        let todos = self.session.todos.lock().await;
        let open = todos
            .items()
            .iter()
            .filter(|t| t.status != TodoStatus::Completed)
            .count();
        (open > 0).then_some(open)
    }

    /// Give the model one final tool-free turn to summarise instead of
    /// stopping abruptly when the round cap is hit.
    async fn wrap_up_turn(&mut self, tx: &mpsc::Sender<AgentEvent>, max_rounds: u32) {
        let wrap = format!(
            "You have reached the maximum tool-call budget ({max_rounds} rounds). \
             Do not call any more tools. Write a concise summary of what was \
             completed, what remains, and how to continue."
        );
        self.session.push(Message::user(&wrap));
        let req = CompletionRequest {
            messages: self.session.messages.clone(),
            tool_docs: None,
        };
        match self.provider.complete(req).await {
            Ok(text) if !text.is_empty() => {
                self.session.push(Message::assistant(&text));
                let _ = tx.send(AgentEvent::AssistantMessage(text)).await;
            }
            Ok(_) => {}
            Err(e) => warn!("wrap-up completion failed: {e}"),
        }
        let _ = tx.send(AgentEvent::RoundCapReached { rounds: max_rounds }).await;
    }

    /// Truncate the window when the token estimate exceeds the budget.
    async fn enforce_window(&mut self, tx: &mpsc::Sender<AgentEvent>) {
        let w = &self.config.window;
        if w.token_budget == 0 {
            return;
        }
        let threshold = (w.token_budget as f32 * w.trigger_fraction) as usize;
        if self.session.token_count <= threshold {
            return;
        }
        let before = self.session.messages.len();
        let truncated = truncate_messages(&self.session.messages, w.frac_to_remove);
        let after = truncated.len();
        if after < before {
            debug!(before, after, "window truncated");
            self.session.replace_messages(truncated);
            let _ = tx.send(AgentEvent::WindowTruncated { before, after }).await;
        }
    }

    /// Drain pending tool events and translate them to agent events.  The
    /// mode handle was already updated by the tool itself; this only keeps
    /// consumers informed.
    async fn drain_tool_events(&mut self, tx: &mpsc::Sender<AgentEvent>) {
        while let Ok(event) = self.tool_event_rx.try_recv() {
            match event {
                ToolEvent::TodoUpdate(items) => {
                    let _ = tx.send(AgentEvent::TodoUpdate(items)).await;
                }
                ToolEvent::ModeChanged(slug) => {
                    let _ = tx.send(AgentEvent::ModeChanged(slug)).await;
                }
            }
        }
    }
}

/// Both an explicit `send(())` and a dropped sender count as cancellation;
/// a plain `.is_ok()` check would miss the dropped-sender case.
fn cancelled(cancel: &mut oneshot::Receiver<()>) -> bool {
    !matches!(cancel.try_recv(), Err(oneshot::error::TryRecvError::Empty))
}

/// Hard-cap one tool result at the nearest line boundary so a single huge
/// output cannot blow the window before truncation gets a chance to run.
fn cap_result(content: &str, cap_chars: usize) -> String {
    if cap_chars == 0 || content.len() <= cap_chars {
        return content.to_string();
    }
    let mut cap = cap_chars;
    while !content.is_char_boundary(cap) {
        cap -= 1;
    }
    let cut = content[..cap].rfind('\n').map(|p| p + 1).unwrap_or(cap);
    let omitted = content.len() - cut;
    format!("{}[... {omitted} bytes omitted to fit the context budget ...]", &content[..cut])
}
