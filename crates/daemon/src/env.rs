// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Report command used when `RJ_WORKER_COMMAND` is unset.
pub const DEFAULT_WORKER_COMMAND: &str = "rj-run-report";

/// Resolve state directory: RJ_STATE_DIR > XDG_STATE_HOME/rj > ~/.local/state/rj
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("RJ_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("rj"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/rj"))
}

fn parse_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<u64>().ok())
}

/// How long a job may stay `PENDING` (default 60 minutes)
pub fn running_timeout() -> Duration {
    Duration::from_secs(parse_u64("RJ_RUNNING_TIMEOUT_MINS").unwrap_or(60) * 60)
}

/// How long a job may stay `SUBMITTED` (default 3 minutes)
pub fn submission_timeout() -> Duration {
    Duration::from_secs(parse_u64("RJ_SUBMISSION_TIMEOUT_MINS").unwrap_or(3) * 60)
}

/// Hunter poll interval (default 10s)
pub fn hunter_poll() -> Duration {
    Duration::from_millis(parse_u64("RJ_HUNTER_POLL_MS").unwrap_or(10_000))
}

/// TTL of snapshots written on the read and run paths (default 15s)
pub fn cache_ttl() -> Duration {
    Duration::from_secs(parse_u64("RJ_CACHE_TTL_SECS").unwrap_or(15))
}

/// Shell command that renders one report
pub fn worker_command() -> String {
    std::env::var("RJ_WORKER_COMMAND")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_WORKER_COMMAND.to_string())
}

/// Whether the report command prints an `ExecutionOutput` JSON document
/// (`RJ_WORKER_OUTPUT=json`) rather than bare HTML
pub fn worker_output_json() -> bool {
    std::env::var("RJ_WORKER_OUTPUT").is_ok_and(|s| s.trim().eq_ignore_ascii_case("json"))
}

/// Default number of rows in job listings (default 100)
pub fn result_limit() -> usize {
    parse_u64("RJ_RESULT_LIMIT").map(|n| n as usize).unwrap_or(100)
}

/// Delay after cancelling jobs at shutdown so pollers see it (default 2s)
pub fn shutdown_grace() -> Duration {
    Duration::from_millis(parse_u64("RJ_SHUTDOWN_GRACE_MS").unwrap_or(2_000))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
