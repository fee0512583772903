// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Whole-loop tests: scripted model turns driven through the real parser,
//! gate, registry, and session.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use vidar_config::Config;
use vidar_model::{Role, ScriptedProvider};
use vidar_tools::{
    ApproveAll, AskFollowupTool, AttemptCompletionTool, CommandPolicy, ExecuteCommandTool,
    PermissionGate, ReadFileTool, SwitchModeTool, ToolRegistry, UpdateTodoTool, WriteFileTool,
};

use crate::{Agent, AgentEvent, Session};

fn build_agent(turns: Vec<&str>, config: Config, start_mode: &str) -> Agent {
    let session = Session::new(start_mode);
    let (tool_tx, tool_rx) = mpsc::channel(32);

    let mut registry = ToolRegistry::new();
    registry.register(ReadFileTool);
    registry.register(WriteFileTool);
    registry.register(ExecuteCommandTool::new(
        CommandPolicy::from_config(&config.tools),
        Arc::new(ApproveAll),
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
    let provider = Arc::new(ScriptedProvider::new(
        turns.into_iter().map(String::from).collect(),
    ));

    Agent::new(provider, Arc::new(registry), gate, Arc::new(config), session, tool_rx)
}

async fn run(agent: &mut Agent, input: &str) -> Vec<AgentEvent> {
    let (tx, mut rx) = mpsc::channel(64);
    agent.submit(input, tx).await.unwrap();
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

fn completion(result: &str) -> String {
    format!("<attempt_completion>\n<result>{result}</result>\n</attempt_completion>")
}

// ── Completion ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn completes_on_first_turn() {
    let mut agent = build_agent(vec![&completion("Nothing to do.")], Config::default(), "code");
    let events = run(&mut agent, "do nothing").await;
    assert!(events
        .iter()
        .any(|e| matches!(e, AgentEvent::Completed { result } if result == "Nothing to do.")));
}

#[tokio::test]
async fn executes_a_tool_then_completes() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("data.txt");
    std::fs::write(&file, "alpha\nbeta\n").unwrap();

    let read_turn = format!(
        "Reading the file.\n<read_file>\n<path>{}</path>\n</read_file>",
        file.display()
    );
    let mut agent =
        build_agent(vec![&read_turn, &completion("done")], Config::default(), "code");
    let events = run(&mut agent, "read data.txt").await;

    assert!(events.iter().any(
        |e| matches!(e, AgentEvent::ToolCallFinished { name, output, is_error }
            if name == "read_file" && output.contains("L1:alpha") && !is_error)
    ));
    assert!(events.iter().any(|e| matches!(e, AgentEvent::Completed { .. })));

    // history: system, user, assistant, tool, assistant
    let roles: Vec<Role> = agent.session().messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    assert!(agent.session().messages[3].content.starts_with("[read_file] Result:"));
}

// ── Recoverable failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn parse_failure_is_fed_back_and_loop_recovers() {
    let mut agent = build_agent(
        vec!["I will think about it first.", &completion("recovered")],
        Config::default(),
        "code",
    );
    let events = run(&mut agent, "task").await;

    assert!(events.iter().any(|e| matches!(e, AgentEvent::ParseFailure(_))));
    assert!(events.iter().any(|e| matches!(e, AgentEvent::Completed { .. })));
    assert!(agent
        .session()
        .messages
        .iter()
        .any(|m| m.role == Role::Tool && m.content.starts_with("[protocol] Error:")));
}

#[tokio::test]
async fn unknown_tool_is_a_recoverable_dispatch_error() {
    let mut agent = build_agent(
        vec!["<mystery_tool>\n<x>1</x>\n</mystery_tool>", &completion("ok")],
        Config::default(),
        "code",
    );
    let events = run(&mut agent, "task").await;
    assert!(events.iter().any(
        |e| matches!(e, AgentEvent::ToolCallFinished { name, is_error, output }
            if name == "mystery_tool" && *is_error && output.contains("unknown tool"))
    ));
    assert!(events.iter().any(|e| matches!(e, AgentEvent::Completed { .. })));
}

// ── Permissions ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn ask_mode_denies_execute_command_and_model_adapts() {
    let mut agent = build_agent(
        vec![
            "<execute_command>\n<command>echo hi</command>\n</execute_command>",
            &completion("answered without running anything"),
        ],
        Config::default(),
        "ask",
    );
    let events = run(&mut agent, "what does the build do?").await;

    assert!(events.iter().any(
        |e| matches!(e, AgentEvent::PermissionDenied { tool, mode, .. }
            if tool == "execute_command" && mode == "ask")
    ));
    // the denial was folded back as a tool message, not thrown
    assert!(agent
        .session()
        .messages
        .iter()
        .any(|m| m.role == Role::Tool && m.content.contains("not allowed in 'ask' mode")));
    assert!(events.iter().any(|e| matches!(e, AgentEvent::Completed { .. })));
}

#[tokio::test]
async fn switching_mode_unlocks_tools_on_the_next_round() {
    let mut agent = build_agent(
        vec![
            "<switch_mode>\n<mode_slug>code</mode_slug>\n</switch_mode>",
            "<execute_command>\n<command>echo unlocked</command>\n</execute_command>",
            &completion("ran it"),
        ],
        Config::default(),
        "ask",
    );
    let events = run(&mut agent, "run echo").await;

    assert!(events
        .iter()
        .any(|e| matches!(e, AgentEvent::ModeChanged(slug) if slug == "code")));
    assert!(events.iter().any(
        |e| matches!(e, AgentEvent::ToolCallFinished { name, output, is_error }
            if name == "execute_command" && output.contains("unlocked") && !is_error)
    ));
}

#[tokio::test]
async fn custom_mode_deny_list_is_enforced() {
    let mut config = Config::default();
    config.modes.push(vidar_config::ModeDef {
        slug: "restricted".into(),
        name: None,
        allowed_tools: None,
        denied_tools: Some(vec!["write_to_file".into()]),
    });
    let mut agent = build_agent(
        vec![
            "<write_to_file>\n<path>x.txt</path>\n<content>data</content>\n</write_to_file>",
            &completion("gave up writing"),
        ],
        config,
        "restricted",
    );
    let events = run(&mut agent, "write a file").await;
    assert!(events.iter().any(
        |e| matches!(e, AgentEvent::PermissionDenied { tool, .. } if tool == "write_to_file")
    ));
}

// ── Todo completion gate ──────────────────────────────────────────────────────

#[tokio::test]
async fn completion_is_blocked_while_todos_are_open() {
    let mut config = Config::default();
    config.agent.enforce_todo_completion = true;
    let mut agent = build_agent(
        vec![
            "<update_todo_list>\n<todos>\n- [-] implement the fix\n</todos>\n</update_todo_list>",
            &completion("too early"),
            "<update_todo_list>\n<todos>\n- [x] implement the fix\n</todos>\n</update_todo_list>",
            &completion("actually done"),
        ],
        config,
        "code",
    );
    let events = run(&mut agent, "fix the bug").await;

    let completions: Vec<&AgentEvent> = events
        .iter()
        .filter(|e| matches!(e, AgentEvent::Completed { .. }))
        .collect();
    assert_eq!(completions.len(), 1);
    assert!(matches!(
        completions[0],
        AgentEvent::Completed { result } if result == "actually done"
    ));
    assert!(agent
        .session()
        .messages
        .iter()
        .any(|m| m.content.contains("todo item(s) are not completed")));
}

// ── Questions ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn followup_question_ends_the_turn() {
    let mut agent = build_agent(
        vec!["<ask_followup_question>\n<question>Which branch?</question>\n</ask_followup_question>"],
        Config::default(),
        "code",
    );
    let events = run(&mut agent, "deploy").await;
    assert!(events
        .iter()
        .any(|e| matches!(e, AgentEvent::Question(q) if q == "Which branch?")));
    assert!(!events.iter().any(|e| matches!(e, AgentEvent::Completed { .. })));
}

// ── Window enforcement ────────────────────────────────────────────────────────

#[tokio::test]
async fn window_is_truncated_when_over_budget() {
    let mut config = Config::default();
    config.window.token_budget = 8;
    config.window.trigger_fraction = 0.5;
    config.window.frac_to_remove = 0.5;
    let mut agent = build_agent(
        vec![
            "thinking out loud, no call yet, just filling up the context window",
            "still pondering the problem and burning context space as I go",
            "one more pondering turn before acting on anything at all here",
            &completion("done"),
        ],
        config,
        "code",
    );
    let events = run(&mut agent, "task").await;

    assert!(events
        .iter()
        .any(|e| matches!(e, AgentEvent::WindowTruncated { before, after } if after < before)));
    // the system prompt anchor is never evicted
    assert_eq!(agent.session().messages[0].role, Role::System);
    assert!(events.iter().any(|e| matches!(e, AgentEvent::Completed { .. })));
}

// ── Cancellation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn pre_resolved_cancel_aborts_without_a_model_call() {
    let provider_turns = vec![completion("never sent")];
    let mut agent = build_agent(
        provider_turns.iter().map(String::as_str).collect(),
        Config::default(),
        "code",
    );
    let (cancel_tx, cancel_rx) = oneshot::channel();
    cancel_tx.send(()).unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    agent.submit_with_cancel("task", tx, cancel_rx).await.unwrap();

    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    assert!(events.iter().any(|e| matches!(e, AgentEvent::Aborted)));
    assert!(!events.iter().any(|e| matches!(e, AgentEvent::Completed { .. })));
}

#[tokio::test]
async fn dropped_cancel_sender_also_aborts() {
    let turns = vec![completion("unused")];
    let mut agent =
        build_agent(turns.iter().map(String::as_str).collect(), Config::default(), "code");
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    drop(cancel_tx);

    let (tx, mut rx) = mpsc::channel(8);
    agent.submit_with_cancel("task", tx, cancel_rx).await.unwrap();
    let mut aborted = false;
    while let Ok(e) = rx.try_recv() {
        aborted |= matches!(e, AgentEvent::Aborted);
    }
    assert!(aborted);
}

// ── Round cap ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn round_cap_triggers_a_wrap_up_summary() {
    let mut config = Config::default();
    config.agent.max_tool_rounds = 1;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("f.txt");
    std::fs::write(&file, "content").unwrap();
    let read_turn = format!("<read_file>\n<path>{}</path>\n</read_file>", file.display());

    let mut agent = build_agent(
        vec![&read_turn, "I read the file; the task is unfinished."],
        config,
        "code",
    );
    let events = run(&mut agent, "big task").await;

    assert!(events
        .iter()
        .any(|e| matches!(e, AgentEvent::RoundCapReached { rounds: 1 })));
    assert!(events.iter().any(
        |e| matches!(e, AgentEvent::AssistantMessage(m) if m.contains("unfinished"))
    ));
}
