// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rjd`: report job runner

use clap::Parser;
use rj_daemon::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = rj_daemon::commands::dispatch(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
