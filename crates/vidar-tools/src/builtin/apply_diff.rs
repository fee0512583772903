// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use tracing::debug;

use vidar_protocol::{ToolCall, ToolSyntax};

use crate::diff::{apply_diff, DiffError};
use crate::tool::{Tool, ToolOutput};

pub struct ApplyDiffTool;

#[async_trait]
impl Tool for ApplyDiffTool {
    fn name(&self) -> &str {
        "apply_diff"
    }

    fn description(&self) -> &str {
        "Edit an existing file with one or more SEARCH/REPLACE blocks:\n\n\
         <<<<<<< SEARCH\n\
         exact lines currently in the file\n\
         =======\n\
         replacement lines\n\
         >>>>>>> REPLACE\n\n\
         The SEARCH text must match the file exactly (whitespace included) \
         and its FIRST occurrence is replaced. The file is only written when \
         every block matches; on any mismatch nothing is persisted and each \
         failed block is reported with the nearest matching region."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("apply_diff")
            .required("path", "File path here")
            .required("diff", "One or more SEARCH/REPLACE blocks")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(path) = call.param("path") else {
            return ToolOutput::err("missing required parameter 'path'");
        };
        let Some(patch) = call.param("diff") else {
            return ToolOutput::err("missing required parameter 'diff'");
        };

        let original = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => return ToolOutput::err(format!("cannot read {path}: {e}")),
        };

        match apply_diff(&original, patch) {
            Ok(applied) => {
                debug!(path = %path, blocks = applied.applied, "apply_diff tool");
                match tokio::fs::write(path, &applied.content).await {
                    Ok(()) => ToolOutput::ok(format!(
                        "Applied {} block(s) to {path}",
                        applied.applied
                    )),
                    Err(e) => ToolOutput::err(format!("write error: {e}")),
                }
            }
            Err(DiffError::NoBlocks) => {
                ToolOutput::err("no SEARCH/REPLACE blocks found in the diff; nothing to apply")
            }
            Err(DiffError::ApplyFailed { failed, total, .. }) => {
                // The stored file stays untouched; report every failure so
                // the model can fix them all in one retry.
                let mut msg = format!(
                    "{} of {total} blocks failed to match; {path} was NOT modified.\n",
                    failed.len()
                );
                for f in &failed {
                    msg.push_str(&format!("\nBlock {} search text:\n{}\n", f.index + 1, f.search));
                    if let Some(hint) = &f.hint {
                        msg.push_str(&format!("Nearest match in file:\n{hint}\n"));
                    }
                }
                msg.push_str("\nRe-read the file and retry with exact search text.");
                ToolOutput::err(msg)
            }
        }
    }
}
