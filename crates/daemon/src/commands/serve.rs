// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rjd serve`

use anyhow::Result;
use tracing::info;

use crate::lifecycle::{startup, Config};

/// Hold the state directory and run the hunter until interrupted.
///
/// `serve` and `run` both take the exclusive state lock, so one process at a
/// time works a state directory and that process runs the only hunter.
pub async fn serve(config: Config) -> Result<()> {
    let _log_guard = crate::logging::init_file(&config.logs_path)?;
    let daemon = startup(config)?;
    let hunter = daemon.start_hunter();
    info!(
        poll_ms = daemon.config.hunter.poll_interval.as_millis() as u64,
        "rjd serving; press ctrl-c to stop"
    );
    println!("READY");

    tokio::signal::ctrl_c().await?;
    info!("interrupt received");
    daemon.shutdown(Some(hunter)).await?;
    Ok(())
}
