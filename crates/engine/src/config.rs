// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Hunter poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// How long a job may stay `SUBMITTED`
pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(3 * 60);
/// How long a job may stay `PENDING`
pub const DEFAULT_RUNNING_TIMEOUT: Duration = Duration::from_secs(60 * 60);
/// TTL of snapshots the hunter writes
pub const DEFAULT_HUNTER_CACHE_TTL: Duration = Duration::from_secs(5);
/// TTL of snapshots written on the read and run paths
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15);
/// Overlap between consecutive change queries
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(60);
/// How often the hunter loop drops expired cache entries
pub const DEFAULT_CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Job ids remembered per outcome for counter dedup
pub const DEFAULT_RECENT_CAPACITY: usize = 10_000;
/// Streamed output lines buffered before they are written
pub const DEFAULT_STDOUT_BATCH_LINES: usize = 50;
/// Longest a streamed output line waits before it is written
pub const DEFAULT_STDOUT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct HunterConfig {
    pub poll_interval: Duration,
    pub submission_timeout: Duration,
    pub running_timeout: Duration,
    pub cache_ttl: Duration,
    /// Widened to just over `poll_interval` when set lower
    pub lookback: Duration,
    pub recent_capacity: usize,
    pub cache_purge_interval: Duration,
    /// Propagate iteration errors instead of logging them
    pub strict: bool,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
            running_timeout: DEFAULT_RUNNING_TIMEOUT,
            cache_ttl: DEFAULT_HUNTER_CACHE_TTL,
            lookback: DEFAULT_LOOKBACK,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            cache_purge_interval: DEFAULT_CACHE_PURGE_INTERVAL,
            strict: false,
        }
    }
}

impl HunterConfig {
    rj_core::setters! {
        set {
            poll_interval: Duration,
            submission_timeout: Duration,
            running_timeout: Duration,
            cache_ttl: Duration,
            lookback: Duration,
            recent_capacity: usize,
            cache_purge_interval: Duration,
            strict: bool,
        }
    }

    /// Lookback actually applied: always longer than one poll interval.
    pub fn effective_lookback(&self) -> Duration {
        self.lookback.max(self.poll_interval + Duration::from_secs(1))
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub cache_ttl: Duration,
    /// Flush streamed output once this many lines are buffered
    pub stdout_batch_lines: usize,
    /// Flush streamed output at least this often
    pub stdout_flush_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            stdout_batch_lines: DEFAULT_STDOUT_BATCH_LINES,
            stdout_flush_interval: DEFAULT_STDOUT_FLUSH_INTERVAL,
        }
    }
}

impl CoordinatorConfig {
    rj_core::setters! {
        set {
            cache_ttl: Duration,
            stdout_batch_lines: usize,
            stdout_flush_interval: Duration,
        }
    }
}
