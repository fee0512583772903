// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod parser;
mod syntax;

pub use parser::{ParseError, ToolCallParser};
pub use syntax::{ParamSpec, ToolCall, ToolSyntax};
