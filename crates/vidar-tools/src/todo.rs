// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Progress state of one task item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    /// Legal transitions: one step forward, or staying put.
    pub fn can_become(self, next: TodoStatus) -> bool {
        self == next
            || matches!(
                (self, next),
                (TodoStatus::Pending, TodoStatus::InProgress)
                    | (TodoStatus::InProgress, TodoStatus::Completed)
            )
    }

    fn marker(self) -> char {
        match self {
            TodoStatus::Pending => ' ',
            TodoStatus::InProgress => '-',
            TodoStatus::Completed => 'x',
        }
    }

    fn from_marker(c: char) -> Option<Self> {
        match c {
            ' ' => Some(TodoStatus::Pending),
            '-' => Some(TodoStatus::InProgress),
            'x' | 'X' => Some(TodoStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TodoStatus::Pending => write!(f, "pending"),
            TodoStatus::InProgress => write!(f, "in_progress"),
            TodoStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One task item.  The id is either caller-assigned or a short content
/// hash, so a well-formed checklist round-trips through markdown exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TodoError {
    #[error("unknown todo item '{id}'")]
    UnknownItem { id: String },
    #[error("illegal status transition {from} -> {to} for '{id}'")]
    InvalidTransition { id: String, from: TodoStatus, to: TodoStatus },
    #[error("malformed checklist line {line}: {text:?}")]
    Malformed { line: usize, text: String },
}

/// Ordered task list with monotonic-forward status transitions.
///
/// Any update that would move an item backward is rejected as a whole and
/// leaves the list untouched, so callers can tell the model exactly why
/// nothing changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoList {
    items: Vec<TodoItem>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Append an item; the id defaults to a hash of the content.
    pub fn add(&mut self, content: impl Into<String>, id: Option<String>) -> &TodoItem {
        let content = content.into();
        let id = id.unwrap_or_else(|| content_id(&content));
        self.items.push(TodoItem { id, content, status: TodoStatus::Pending });
        self.items.last().expect("just pushed")
    }

    pub fn remove(&mut self, id: &str) -> Result<(), TodoError> {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        if self.items.len() == before {
            return Err(TodoError::UnknownItem { id: id.to_string() });
        }
        Ok(())
    }

    /// Move one item to `status`, enforcing the transition law.
    pub fn set_status(&mut self, id: &str, status: TodoStatus) -> Result<(), TodoError> {
        let item = self
            .items
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TodoError::UnknownItem { id: id.to_string() })?;
        if !item.status.can_become(status) {
            return Err(TodoError::InvalidTransition {
                id: id.to_string(),
                from: item.status,
                to: status,
            });
        }
        item.status = status;
        Ok(())
    }

    /// Replace the whole list from a markdown checklist.
    ///
    /// Items whose id matches an existing one must obey the transition law;
    /// if any violates it the update is rejected and the list is unchanged.
    pub fn replace_from_markdown(&mut self, text: &str) -> Result<(), TodoError> {
        let incoming = Self::parse_markdown(text)?;
        for new_item in &incoming {
            if let Some(existing) = self.items.iter().find(|t| t.id == new_item.id) {
                if !existing.status.can_become(new_item.status) {
                    return Err(TodoError::InvalidTransition {
                        id: new_item.id.clone(),
                        from: existing.status,
                        to: new_item.status,
                    });
                }
            }
        }
        self.items = incoming;
        Ok(())
    }

    /// Parse `- [ ] / - [-] / - [x]` checklist lines.  Blank lines are
    /// skipped; anything else is malformed.
    pub fn parse_markdown(text: &str) -> Result<Vec<TodoItem>, TodoError> {
        let mut items = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let item = parse_checklist_line(trimmed).ok_or_else(|| TodoError::Malformed {
                line: i + 1,
                text: line.to_string(),
            })?;
            items.push(item);
        }
        Ok(items)
    }

    /// Render back to the same checklist form that `parse_markdown` reads.
    pub fn to_markdown(&self) -> String {
        self.items
            .iter()
            .map(|t| format!("- [{}] {}", t.status.marker(), t.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when every item is completed.  An empty list counts as
    /// complete — the completion gate only blocks on explicit open work.
    pub fn all_completed(&self) -> bool {
        self.items.iter().all(|t| t.status == TodoStatus::Completed)
    }
}

fn parse_checklist_line(line: &str) -> Option<TodoItem> {
    let rest = line.strip_prefix("- [")?;
    let marker = rest.chars().next()?;
    let status = TodoStatus::from_marker(marker)?;
    let rest = &rest[marker.len_utf8()..];
    let content = rest.strip_prefix("] ")?.trim_end();
    if content.is_empty() {
        return None;
    }
    Some(TodoItem {
        id: content_id(content),
        content: content.to_string(),
        status,
    })
}

/// Short hex digest of the item content, used when no id is assigned.
fn content_id(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(&digest[..4])
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn list_from(text: &str) -> TodoList {
        let mut list = TodoList::new();
        list.replace_from_markdown(text).unwrap();
        list
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    #[test]
    fn forward_transitions_are_legal() {
        assert!(TodoStatus::Pending.can_become(TodoStatus::InProgress));
        assert!(TodoStatus::InProgress.can_become(TodoStatus::Completed));
    }

    #[test]
    fn idempotent_transitions_are_legal() {
        for s in [TodoStatus::Pending, TodoStatus::InProgress, TodoStatus::Completed] {
            assert!(s.can_become(s));
        }
    }

    #[test]
    fn skipping_a_state_is_illegal() {
        assert!(!TodoStatus::Pending.can_become(TodoStatus::Completed));
    }

    #[test]
    fn backward_transitions_are_illegal() {
        assert!(!TodoStatus::Completed.can_become(TodoStatus::Pending));
        assert!(!TodoStatus::Completed.can_become(TodoStatus::InProgress));
        assert!(!TodoStatus::InProgress.can_become(TodoStatus::Pending));
    }

    #[test]
    fn set_status_rejects_backward_and_leaves_list_unchanged() {
        let mut list = list_from("- [x] ship the release");
        let id = list.items()[0].id.clone();
        let err = list.set_status(&id, TodoStatus::Pending).unwrap_err();
        assert!(matches!(err, TodoError::InvalidTransition { .. }));
        assert_eq!(list.items()[0].status, TodoStatus::Completed);
    }

    #[test]
    fn set_status_unknown_id_is_an_error() {
        let mut list = TodoList::new();
        let err = list.set_status("nope", TodoStatus::Completed).unwrap_err();
        assert_eq!(err, TodoError::UnknownItem { id: "nope".into() });
    }

    // ── Add / remove ──────────────────────────────────────────────────────────

    #[test]
    fn add_assigns_content_hash_id_when_none_given() {
        let mut list = TodoList::new();
        let id = list.add("write tests", None).id.clone();
        assert_eq!(id.len(), 8);
        assert_eq!(id, content_id("write tests"));
    }

    #[test]
    fn add_keeps_caller_assigned_id() {
        let mut list = TodoList::new();
        assert_eq!(list.add("task", Some("t1".into())).id, "t1");
    }

    #[test]
    fn remove_by_id() {
        let mut list = TodoList::new();
        list.add("a", Some("1".into()));
        list.add("b", Some("2".into()));
        list.remove("1").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.items()[0].id, "2");
        assert!(list.remove("1").is_err());
    }

    // ── Markdown round-trip ───────────────────────────────────────────────────

    #[test]
    fn parses_all_three_markers() {
        let items =
            TodoList::parse_markdown("- [ ] open\n- [-] working\n- [x] done").unwrap();
        assert_eq!(items[0].status, TodoStatus::Pending);
        assert_eq!(items[1].status, TodoStatus::InProgress);
        assert_eq!(items[2].status, TodoStatus::Completed);
    }

    #[test]
    fn uppercase_x_is_completed() {
        let items = TodoList::parse_markdown("- [X] done").unwrap();
        assert_eq!(items[0].status, TodoStatus::Completed);
    }

    #[test]
    fn round_trip_is_identity_for_well_formed_lists() {
        let text = "- [ ] investigate the bug\n- [-] write the fix\n- [x] file the issue";
        let list = list_from(text);
        assert_eq!(list.to_markdown(), text);
        let reparsed = TodoList::parse_markdown(&list.to_markdown()).unwrap();
        assert_eq!(reparsed, list.items());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let items = TodoList::parse_markdown("- [ ] a\n\n- [x] b\n").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = TodoList::parse_markdown("- [ ] fine\n* not a checklist").unwrap_err();
        assert_eq!(err, TodoError::Malformed { line: 2, text: "* not a checklist".into() });
    }

    #[test]
    fn unknown_marker_is_malformed() {
        assert!(TodoList::parse_markdown("- [?] maybe").is_err());
    }

    #[test]
    fn empty_content_is_malformed() {
        assert!(TodoList::parse_markdown("- [ ] ").is_err());
    }

    // ── Bulk replace ──────────────────────────────────────────────────────────

    #[test]
    fn bulk_replace_advances_matching_items() {
        let mut list = list_from("- [ ] implement feature\n- [ ] test feature");
        list.replace_from_markdown("- [-] implement feature\n- [ ] test feature")
            .unwrap();
        assert_eq!(list.items()[0].status, TodoStatus::InProgress);
    }

    #[test]
    fn bulk_replace_rejects_backward_transition_wholesale() {
        let mut list = list_from("- [x] implement feature\n- [-] test feature");
        let err = list
            .replace_from_markdown("- [ ] implement feature\n- [x] test feature")
            .unwrap_err();
        assert!(matches!(err, TodoError::InvalidTransition { .. }));
        // list unchanged, including the item whose transition was legal
        assert_eq!(list.items()[0].status, TodoStatus::Completed);
        assert_eq!(list.items()[1].status, TodoStatus::InProgress);
    }

    #[test]
    fn bulk_replace_may_drop_and_add_items() {
        let mut list = list_from("- [x] old task");
        list.replace_from_markdown("- [ ] new task").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.items()[0].content, "new task");
    }

    // ── Completion gate ───────────────────────────────────────────────────────

    #[test]
    fn all_completed_requires_every_item_done() {
        let list = list_from("- [x] a\n- [-] b");
        assert!(!list.all_completed());
        let list = list_from("- [x] a\n- [x] b");
        assert!(list.all_completed());
    }

    #[test]
    fn empty_list_counts_as_completed() {
        assert!(TodoList::new().all_completed());
    }
}
