// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use vidar_core::{Agent, AgentEvent, Session};
use vidar_model::{MockProvider, ModelProvider, ScriptedProvider};
use vidar_tools::{
    ApprovalHandler, ApprovalResponse, ApproveAll, ApplyDiffTool, AskFollowupTool,
    AttemptCompletionTool, CommandPolicy, ExecuteCommandTool, FilePreview, ListFilesTool,
    PermissionGate, ReadFileTool, SearchFilesTool, SwitchModeTool, ToolRegistry, UpdateTodoTool,
    WriteFileTool,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Some(cmd) = &cli.command {
        match cmd {
            Commands::Completions { shell } => {
                cli::print_completions(*shell);
                return Ok(());
            }
            Commands::ShowConfig => {
                let config = vidar_config::load(cli.config.as_deref())?;
                println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
                return Ok(());
            }
        }
    }

    let task = match &cli.task {
        Some(t) => t.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading task from stdin")?;
            buf.trim().to_string()
        }
    };
    if task.is_empty() {
        anyhow::bail!("no task given; pass it as an argument or pipe it on stdin");
    }

    let config = Arc::new(vidar_config::load(cli.config.as_deref())?);

    // The CLI ships the replay and mock drivers; real model backends are
    // wired in by embedding frontends behind the same trait.
    let provider: Arc<dyn ModelProvider> = match &cli.script {
        Some(path) => Arc::new(
            ScriptedProvider::from_yaml_file(path)
                .with_context(|| format!("loading script {}", path.display()))?,
        ),
        None => Arc::new(MockProvider),
    };

    let approval: Arc<dyn ApprovalHandler> = if cli.yes {
        Arc::new(ApproveAll)
    } else {
        Arc::new(StdinApproval)
    };

    let start_mode = cli
        .mode
        .clone()
        .unwrap_or_else(|| config.agent.default_mode.clone());
    let session = Session::new(&start_mode);
    let (tool_tx, tool_rx) = mpsc::channel(32);

    let mut registry = ToolRegistry::new();
    registry.register(ReadFileTool);
    registry.register(WriteFileTool);
    registry.register(ApplyDiffTool);
    registry.register(SearchFilesTool);
    registry.register(ListFilesTool);
    registry.register(ExecuteCommandTool::new(
        CommandPolicy::from_config(&config.tools),
        approval,
        config.tools.command_timeout_secs,
    ));
    registry.register(UpdateTodoTool::new(session.todos.clone(), tool_tx.clone()));
    registry.register(SwitchModeTool::new(
        session.mode.clone(),
        config.modes.clone(),
        tool_tx.clone(),
    ));
    registry.register(AskFollowupTool);
    registry.register(AttemptCompletionTool);

    let gate = PermissionGate::new(config.modes.clone());
    let mut agent = Agent::new(provider, Arc::new(registry), gate, config, session, tool_rx);

    let (tx, mut rx) = mpsc::channel(64);
    let runner = tokio::spawn(async move {
        let result = agent.submit(&task, tx).await;
        (agent, result)
    });

    while let Some(event) = rx.recv().await {
        print_event(&event);
    }
    let (_agent, result) = runner.await.context("agent task panicked")?;
    result
}

fn print_event(event: &AgentEvent) {
    match event {
        AgentEvent::AssistantMessage(text) => println!("{text}\n"),
        AgentEvent::ToolCallStarted { name } => eprintln!("→ {name}"),
        AgentEvent::ToolCallFinished { name, is_error, .. } => {
            if *is_error {
                eprintln!("✗ {name} failed");
            } else {
                eprintln!("✓ {name}");
            }
        }
        AgentEvent::ParseFailure(reason) => eprintln!("! malformed tool call: {reason}"),
        AgentEvent::PermissionDenied { reason, .. } => eprintln!("! {reason}"),
        AgentEvent::ModeChanged(slug) => eprintln!("mode → {slug}"),
        AgentEvent::TodoUpdate(items) => {
            for item in items {
                eprintln!("  [{}] {}", item.status, item.content);
            }
        }
        AgentEvent::WindowTruncated { before, after } => {
            eprintln!("(window truncated: {before} → {after} messages)");
        }
        AgentEvent::Question(question) => println!("? {question}"),
        AgentEvent::Completed { result } => println!("{result}"),
        AgentEvent::Aborted => eprintln!("(aborted)"),
        AgentEvent::RoundCapReached { rounds } => {
            eprintln!("(stopped after {rounds} tool rounds)");
        }
    }
}

/// Interactive approval on the controlling terminal.
struct StdinApproval;

#[async_trait]
impl ApprovalHandler for StdinApproval {
    async fn review_files(&self, previews: &[FilePreview]) -> ApprovalResponse {
        let mut approved = std::collections::HashSet::new();
        for preview in previews {
            let prompt = format!(
                "apply {} block(s) to {}? [y/N] ",
                preview.blocks,
                preview.path.display()
            );
            if ask_yes_no(&prompt).await {
                approved.insert(preview.path.clone());
            }
        }
        ApprovalResponse { approved }
    }

    async fn approve_command(&self, command: &str) -> bool {
        ask_yes_no(&format!("run `{command}`? [y/N] ")).await
    }
}

async fn ask_yes_no(prompt: &str) -> bool {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || {
        use std::io::Write;
        eprint!("{prompt}");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes")
    })
    .await
    .unwrap_or(false)
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
