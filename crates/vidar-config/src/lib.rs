// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod loader;
mod schema;

pub use loader::load;
pub use schema::{
    builtin_mode, builtin_mode_slugs, AgentConfig, Config, ModeDef, ToolsConfig, WindowConfig,
};
