// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

#[derive(Parser, Debug)]
#[command(
    name = "vidar",
    about = "A mode-gated AI coding agent runtime",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// The task to run.  Read from stdin when omitted.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Explicit config file merged on top of the discovered layers
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Mode slug to start in (overrides the configured default)
    #[arg(long, short = 'm')]
    pub mode: Option<String>,

    /// YAML file of scripted assistant turns; replays a session without a
    /// model backend
    #[arg(long, short = 's', env = "VIDAR_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Approve every command and file edit without asking
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the merged configuration and exit
    ShowConfig,
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "vidar", &mut std::io::stdout());
}
