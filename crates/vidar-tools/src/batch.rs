// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::diff::apply_diff;

/// Per-path progress of a batched diff application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// Awaiting the approval decision.
    Pending,
    /// Approved and written.
    Approved,
    /// The user declined this path.
    Denied,
    /// Never reached approval: the path escapes the workspace or could not
    /// be read.
    Blocked,
    /// Approved, but the diff failed to apply or the write failed.
    Error,
}

impl std::fmt::Display for PathStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PathStatus::Pending => "pending",
            PathStatus::Approved => "approved",
            PathStatus::Denied => "denied",
            PathStatus::Blocked => "blocked",
            PathStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One file's patch inside a batch.
#[derive(Debug, Clone)]
pub struct FileDiff {
    /// Workspace-relative path.
    pub path: PathBuf,
    pub patch: String,
}

/// What the approval collaborator sees for one file.
#[derive(Debug, Clone)]
pub struct FilePreview {
    pub path: PathBuf,
    pub patch: String,
    /// Number of SEARCH/REPLACE blocks in the patch.
    pub blocks: usize,
}

/// The collaborator's answer: the set of paths the user approved.
/// Every previewed path absent from the set is treated as denied.
#[derive(Debug, Clone, Default)]
pub struct ApprovalResponse {
    pub approved: HashSet<PathBuf>,
}

/// User-interaction collaborator: batch diff previews and command
/// confirmation.  The orchestration core only consumes the decisions.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn review_files(&self, previews: &[FilePreview]) -> ApprovalResponse;
    async fn approve_command(&self, command: &str) -> bool;
}

/// Approves everything.  For tests and the CLI `--yes` mode.
pub struct ApproveAll;

#[async_trait]
impl ApprovalHandler for ApproveAll {
    async fn review_files(&self, previews: &[FilePreview]) -> ApprovalResponse {
        ApprovalResponse {
            approved: previews.iter().map(|p| p.path.clone()).collect(),
        }
    }
    async fn approve_command(&self, _command: &str) -> bool {
        true
    }
}

/// Final state of one path after the batch ran.
#[derive(Debug, Clone)]
pub struct PathOutcome {
    pub path: PathBuf,
    pub status: PathStatus,
    pub detail: Option<String>,
}

/// Apply a batch of per-file patches under `root` with one approval prompt
/// across all files.
///
/// Files are processed sequentially and independently: a failure on one
/// path never rolls back another path's successful write, and denying a
/// subset does not block the approved remainder.
pub async fn apply_batch(
    root: &Path,
    files: &[FileDiff],
    handler: &dyn ApprovalHandler,
) -> Vec<PathOutcome> {
    let mut outcomes: Vec<PathOutcome> = Vec::with_capacity(files.len());
    let mut previews: Vec<FilePreview> = Vec::new();
    // Index into `outcomes` for each previewed path.
    let mut preview_slots: Vec<usize> = Vec::new();

    for file in files {
        if !is_contained(&file.path) {
            outcomes.push(PathOutcome {
                path: file.path.clone(),
                status: PathStatus::Blocked,
                detail: Some("path escapes the workspace root".into()),
            });
            continue;
        }
        let abs = root.join(&file.path);
        if !abs.is_file() {
            outcomes.push(PathOutcome {
                path: file.path.clone(),
                status: PathStatus::Blocked,
                detail: Some(format!("cannot read {}", abs.display())),
            });
            continue;
        }
        previews.push(FilePreview {
            path: file.path.clone(),
            patch: file.patch.clone(),
            blocks: crate::diff::parse_blocks(&file.patch).len(),
        });
        preview_slots.push(outcomes.len());
        outcomes.push(PathOutcome {
            path: file.path.clone(),
            status: PathStatus::Pending,
            detail: None,
        });
    }

    if previews.is_empty() {
        return outcomes;
    }

    let response = handler.review_files(&previews).await;

    for (preview, &slot) in previews.iter().zip(&preview_slots) {
        let outcome = &mut outcomes[slot];
        if !response.approved.contains(&preview.path) {
            outcome.status = PathStatus::Denied;
            continue;
        }
        let abs = root.join(&preview.path);
        let result = match std::fs::read_to_string(&abs) {
            Ok(original) => match apply_diff(&original, &preview.patch) {
                Ok(applied) => std::fs::write(&abs, &applied.content)
                    .map(|()| applied.applied)
                    .map_err(|e| format!("write failed: {e}")),
                Err(e) => Err(e.to_string()),
            },
            Err(e) => Err(format!("read failed: {e}")),
        };
        match result {
            Ok(applied) => {
                debug!(path = %preview.path.display(), applied, "batch file applied");
                outcome.status = PathStatus::Approved;
                outcome.detail = Some(format!("{applied} blocks applied"));
            }
            Err(detail) => {
                outcome.status = PathStatus::Error;
                outcome.detail = Some(detail);
            }
        }
    }

    outcomes
}

/// Reject absolute paths and any `..` traversal.
fn is_contained(path: &Path) -> bool {
    !path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
