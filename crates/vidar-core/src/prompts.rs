// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

/// Tool-use protocol section shared by every mode.
const TOOL_PROTOCOL: &str = "\
# Tool Use

You operate in steps. Each of your messages must contain
EXACTLY ONE tool invocation, formatted as XML-style tags: the outer tag
is the tool name and each child tag is a parameter. For example:

<read_file>
<path>src/main.rs</path>
</read_file>

After each invocation you receive the tool's result in the next message.
Wait for that result before deciding your next step — never assume a tool
succeeded. When the task is done, use attempt_completion to present the
result. If a tool is denied or fails, adapt: the error message tells you
why.";

fn mode_persona(mode_slug: &str) -> &'static str {
    match mode_slug {
        "code" => {
            "You are a skilled software engineer. You read, write, and run \
             code directly in the user's project to carry out their task."
        }
        "architect" => {
            "You are a software architect. You study the project and produce \
             plans and task breakdowns; you do not modify source files."
        }
        "ask" => {
            "You are a knowledgeable assistant. You answer questions about \
             the project using read-only exploration; you never change it."
        }
        _ => {
            "You are an assistant operating in a restricted custom mode; the \
             available tools below define what you may do."
        }
    }
}

/// Assemble the system prompt for one task.
///
/// `tool_docs` is the registry's rendered documentation for the tools
/// callable in the starting mode; `custom_instructions` is appended
/// verbatim when the user configured any.
pub fn system_prompt(mode_slug: &str, tool_docs: &str, custom_instructions: Option<&str>) -> String {
    let mut prompt = String::new();
    prompt.push_str(mode_persona(mode_slug));
    prompt.push_str("\n\n");
    prompt.push_str(TOOL_PROTOCOL);
    prompt.push_str("\n\n# Tools\n\n");
    prompt.push_str(tool_docs);
    if let Some(extra) = custom_instructions {
        prompt.push_str("\n# Custom Instructions\n\n");
        prompt.push_str(extra);
    }
    prompt
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
