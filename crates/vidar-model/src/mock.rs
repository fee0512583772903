// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{CompletionRequest, ModelProvider, Role};

/// Deterministic mock provider for tests.  Echoes the last user message
/// back as the assistant response.
#[derive(Default)]
pub struct MockProvider;

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String> {
        let reply = req
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("[no input]")
            .to_string();
        Ok(format!("MOCK: {reply}"))
    }
}

/// A pre-scripted provider.  Each `complete` call pops the next assistant
/// turn from the front of the queue, letting tests (and the CLI `--script`
/// replay mode) specify exact response sequences — including XML tool
/// calls — without network access.
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<String>>,
    /// The last `CompletionRequest` seen by this provider.  Written on each
    /// `complete()` call so tests can inspect what was sent.
    pub last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

#[derive(Deserialize)]
struct ScriptFile {
    turns: Vec<String>,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<String>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Load a script from a YAML file of the form `turns: ["...", "..."]`.
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let script: ScriptFile = serde_yaml::from_str(&text)?;
        Ok(Self::new(script.turns))
    }

    /// Number of scripted turns not yet consumed.
    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }
    fn model_name(&self) -> &str {
        "scripted-replay"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String> {
        *self.last_request.lock().unwrap() = Some(req);
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted provider exhausted"))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
