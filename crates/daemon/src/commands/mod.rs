// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rjd` subcommands.

mod cleanup;
mod run;
mod serve;
mod status;

pub use cleanup::CleanupArgs;
pub use run::{build_requests, run_requests, RunArgs, RunOutcome};
pub use status::StatusArgs;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::lifecycle::Config;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "rjd", version, about = "Report job runner")]
pub struct Cli {
    /// State directory (defaults to RJ_STATE_DIR, then ~/.local/state/rj)
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the hunter in the foreground until interrupted
    Serve,
    /// Submit a report and run it to completion
    Run(RunArgs),
    /// Show a job's status, or list recent jobs
    Status(StatusArgs),
    /// Delete jobs older than a number of days
    Cleanup(CleanupArgs),
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = match cli.state_dir {
        Some(dir) => Config::from_env(dir),
        None => Config::load()?,
    };
    match cli.command {
        Command::Serve => serve::serve(config).await,
        Command::Run(args) => run::run(config, args, cli.output).await,
        Command::Status(args) => status::status(config, args, cli.output),
        Command::Cleanup(args) => cleanup::cleanup(config, args, cli.output),
    }
}
