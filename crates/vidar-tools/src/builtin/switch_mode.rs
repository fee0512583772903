// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use vidar_config::{builtin_mode, ModeDef};
use vidar_protocol::{ToolCall, ToolSyntax};

use crate::events::ToolEvent;
use crate::tool::{Tool, ToolOutput};

/// Switch the session's operating mode.
///
/// Shares the mode lock with the agent loop so a change is visible on the
/// very next round.  Whether switching itself is allowed in the current
/// mode is the permission gate's decision, made before this tool runs.
pub struct SwitchModeTool {
    current_mode: Arc<Mutex<String>>,
    custom_modes: Vec<ModeDef>,
    event_tx: mpsc::Sender<ToolEvent>,
}

impl SwitchModeTool {
    pub fn new(
        current_mode: Arc<Mutex<String>>,
        custom_modes: Vec<ModeDef>,
        event_tx: mpsc::Sender<ToolEvent>,
    ) -> Self {
        Self { current_mode, custom_modes, event_tx }
    }

    fn resolve(&self, slug: &str) -> Option<ModeDef> {
        self.custom_modes
            .iter()
            .find(|m| m.slug == slug)
            .cloned()
            .or_else(|| builtin_mode(slug))
    }
}

#[async_trait]
impl Tool for SwitchModeTool {
    fn name(&self) -> &str {
        "switch_mode"
    }

    fn description(&self) -> &str {
        "Switch to a different operating mode when the task calls for it.\n\
         Built-in modes:\n\
         - 'code': full read/write/execute tool set\n\
         - 'architect': read, search, and task planning; no edits\n\
         - 'ask': read-only question answering\n\
         Additional modes may be defined in configuration. The mode decides \
         which tools are available on subsequent turns."
    }

    fn syntax(&self) -> ToolSyntax {
        ToolSyntax::new("switch_mode")
            .required("mode_slug", "Target mode slug, e.g. code")
            .optional("reason", "Why the switch is needed")
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(slug) = call.param("mode_slug") else {
            return ToolOutput::err("missing required parameter 'mode_slug'");
        };

        let Some(target) = self.resolve(slug) else {
            return ToolOutput::err(format!("unknown mode: {slug}"));
        };

        let mut current = self.current_mode.lock().await;
        if *current == target.slug {
            return ToolOutput::ok(format!("already in {slug} mode"));
        }

        debug!(from = %current, to = %target.slug, "switch_mode tool");
        *current = target.slug.clone();
        drop(current);

        let _ = self.event_tx.send(ToolEvent::ModeChanged(target.slug.clone())).await;
        ToolOutput::ok(format!("switched to {} mode", target.display_name()))
    }
}
