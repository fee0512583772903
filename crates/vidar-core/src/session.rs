// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use vidar_model::Message;
use vidar_tools::TodoList;

/// In-memory state of one task session.
///
/// The session owns everything that used to be ambient: the message list,
/// the running token estimate, the todo list, and the current mode.  The
/// latter two are `Arc<Mutex<_>>` handles because the todo and mode tools
/// mutate them from inside the registry; the handles are created here and
/// lent out at registration time, so there is no cross-task sharing.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    /// Approximate total token count for the message list (chars/4).
    pub token_count: usize,
    pub mode: Arc<Mutex<String>>,
    pub todos: Arc<Mutex<TodoList>>,
}

impl Session {
    pub fn new(initial_mode: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            messages: Vec::new(),
            token_count: 0,
            mode: Arc::new(Mutex::new(initial_mode.into())),
            todos: Arc::new(Mutex::new(TodoList::new())),
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.token_count += msg.approx_tokens();
        self.messages.push(msg);
    }

    /// Recalculate the token count from scratch (after truncation).
    pub fn recalculate_tokens(&mut self) {
        self.token_count = self.messages.iter().map(Message::approx_tokens).sum();
    }

    /// Replace the message list and recalculate the token count.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.recalculate_tokens();
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_has_unique_id() {
        let a = Session::new("code");
        let b = Session::new("code");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn new_session_starts_empty() {
        let s = Session::new("code");
        assert!(s.messages.is_empty());
        assert_eq!(s.token_count, 0);
    }

    #[test]
    fn push_increments_token_count() {
        let mut s = Session::new("code");
        s.push(Message::user("12345678"));
        assert_eq!(s.token_count, 2);
    }

    #[test]
    fn recalculate_matches_push_sum() {
        let mut s = Session::new("code");
        s.push(Message::user("hello world"));
        s.push(Message::assistant("reply"));
        let after_push = s.token_count;
        s.recalculate_tokens();
        assert_eq!(s.token_count, after_push);
    }

    #[test]
    fn replace_messages_recalculates() {
        let mut s = Session::new("code");
        s.push(Message::user("first"));
        s.push(Message::assistant("second"));
        s.replace_messages(vec![Message::user("only")]);
        assert_eq!(s.messages.len(), 1);
        assert_eq!(s.token_count, 1);
    }

    #[tokio::test]
    async fn mode_handle_is_shared() {
        let s = Session::new("code");
        let handle = s.mode.clone();
        *handle.lock().await = "ask".to_string();
        assert_eq!(*s.mode.lock().await, "ask");
    }

    #[tokio::test]
    async fn todo_handle_starts_empty() {
        let s = Session::new("code");
        assert!(s.todos.lock().await.is_empty());
    }
}
