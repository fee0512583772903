// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use vidar_model::{Message, Role};

/// Sliding-window truncation of the conversation history.
///
/// The transform is non-destructive and pure: a new list is returned and
/// the input stays untouched, so it can run on every turn once the token
/// budget is exceeded.
///
/// Invariants on the output:
/// - `messages[0]` (the system prompt) is always retained;
/// - the count removed is rounded DOWN to an even number so complete
///   user/assistant exchange pairs are cut;
/// - if the cut lands on an assistant or tool message, the start advances
///   (never backward) to the next user message — an exchange cannot begin
///   mid-turn.
///
/// Inputs of one message or fewer come back unchanged, and a
/// `frac_to_remove` outside [0,1] degrades to removing nothing or
/// everything-but-the-anchors rather than panicking.
pub fn truncate_messages(messages: &[Message], frac_to_remove: f64) -> Vec<Message> {
    if messages.len() <= 1 {
        return messages.to_vec();
    }

    let frac = frac_to_remove.clamp(0.0, 1.0);
    let eligible = messages.len() - 1;
    let mut to_remove = (eligible as f64 * frac).floor() as usize;
    to_remove -= to_remove % 2;

    let remainder = &messages[1..];
    let mut start = to_remove;
    while start < remainder.len() && remainder[start].role != Role::User {
        start += 1;
    }

    let mut out = Vec::with_capacity(1 + remainder.len().saturating_sub(start));
    out.push(messages[0].clone());
    out.extend_from_slice(&remainder[start..]);
    out
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
