// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0

use similar::{ChangeTag, TextDiff};

/// One SEARCH/REPLACE edit unit extracted from a patch document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffBlock {
    pub search: String,
    pub replace: String,
}

/// A block that could not be located in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedBlock {
    /// 0-based position of the block in the patch document.
    pub index: usize,
    pub search: String,
    /// Closest-matching region of the file, when one exists.  Diagnostic
    /// only — matching itself is exact.
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    #[error("no SEARCH/REPLACE blocks found in the diff")]
    NoBlocks,
    #[error("{} of {total} blocks failed to match", failed.len())]
    ApplyFailed {
        failed: Vec<FailedBlock>,
        total: usize,
        /// The buffer after the blocks that did match were applied.  For
        /// diagnostic display only — callers must never persist it.
        partial: String,
    },
}

/// A fully successful application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDiff {
    pub content: String,
    pub applied: usize,
}

const SEARCH_MARKER: &str = "<<<<<<< SEARCH";
const SEPARATOR: &str = "=======";
const REPLACE_MARKER: &str = ">>>>>>> REPLACE";

/// Extract all SEARCH/REPLACE blocks from `patch` in document order.
/// Lines outside a marker triple are ignored; an incomplete trailing block
/// is dropped.
pub fn parse_blocks(patch: &str) -> Vec<DiffBlock> {
    enum State {
        Outside,
        Search(Vec<String>),
        Replace(Vec<String>, Vec<String>),
    }

    let mut blocks = Vec::new();
    let mut state = State::Outside;

    for line in patch.lines() {
        let trimmed = line.trim_end_matches('\r');
        state = match (state, trimmed) {
            (State::Outside, SEARCH_MARKER) => State::Search(Vec::new()),
            (State::Search(search), SEPARATOR) => State::Replace(search, Vec::new()),
            (State::Replace(search, replace), REPLACE_MARKER) => {
                blocks.push(DiffBlock {
                    search: search.join("\n"),
                    replace: replace.join("\n"),
                });
                State::Outside
            }
            (State::Search(mut search), other) => {
                search.push(other.to_string());
                State::Search(search)
            }
            (State::Replace(search, mut replace), other) => {
                replace.push(other.to_string());
                State::Replace(search, replace)
            }
            (s @ State::Outside, _) => s,
        };
    }

    blocks
}

/// Apply a SEARCH/REPLACE patch to `content`.
///
/// Each block's search text is located by plain substring search against
/// the *current* (progressively mutated) buffer and its first occurrence is
/// replaced.  First-match is the contract: a search text that also occurs
/// earlier than the intended site silently edits the earlier site.  Blocks
/// that fail to match are recorded and the remaining blocks still run, so
/// the caller can report every failure at once.
///
/// Only a fully successful apply may be persisted; on failure the original
/// stored content is unchanged and the partially-applied buffer is returned
/// for diagnostics.
pub fn apply_diff(content: &str, patch: &str) -> Result<AppliedDiff, DiffError> {
    let blocks = parse_blocks(patch);
    if blocks.is_empty() {
        return Err(DiffError::NoBlocks);
    }
    let total = blocks.len();

    let mut current = content.to_string();
    let mut failed = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        if block.search.is_empty() || !current.contains(&block.search) {
            failed.push(FailedBlock {
                index,
                search: block.search.clone(),
                hint: nearest_region(&current, &block.search),
            });
            continue;
        }
        current = current.replacen(&block.search, &block.replace, 1);
    }

    if failed.is_empty() {
        Ok(AppliedDiff { content: current, applied: total })
    } else {
        Err(DiffError::ApplyFailed { failed, total, partial: current })
    }
}

/// Similarity ratio in [0,1] using character-level diff (2×matches / total).
fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let diff = TextDiff::from_chars(a, b);
    let matching: usize = diff
        .iter_all_changes()
        .filter(|c| c.tag() == ChangeTag::Equal)
        .map(|c| c.value().len())
        .sum();
    (matching * 2) as f64 / total as f64
}

/// The window of `content` most similar to `search` (>50 %), for error
/// messages.  Windows are line-aligned with the same line count as the
/// search text.
fn nearest_region(content: &str, search: &str) -> Option<String> {
    if search.is_empty() {
        return None;
    }
    let lines: Vec<&str> = content.lines().collect();
    let n = search.lines().count().max(1);
    if lines.len() < n {
        return None;
    }
    let mut best: Option<(f64, String)> = None;
    for win in lines.windows(n) {
        let candidate = win.join("\n");
        let ratio = similarity_ratio(search, &candidate);
        if ratio > 0.5 && best.as_ref().map(|(r, _)| ratio > *r).unwrap_or(true) {
            best = Some((ratio, candidate));
        }
    }
    best.map(|(_, region)| region)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
