// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Report job engine: runs jobs, reconciles stale ones in the background,
//! and serves job status cache-first.

mod cleanup;
mod config;
mod context;
mod coordinator;
mod counters;
mod error;
mod hunter;
mod read;
mod recency;

#[cfg(test)]
mod test_helpers;

pub use cleanup::{delete_old_reports, CleanupReport};
pub use config::{CoordinatorConfig, HunterConfig};
pub use context::JobContext;
pub use coordinator::{Coordinator, SubmitRequest};
pub use counters::{CounterSnapshot, OutcomeCounters};
pub use error::{CleanupError, CoordinatorError, HunterError};
pub use hunter::{Hunter, HunterHandle, HunterHealth, IterationReport};
pub use read::ReadApi;
pub use recency::RecencySet;

/// Process-wide shutdown signal shared by the coordinator and the hunter.
pub use tokio_util::sync::CancellationToken as ShutdownSignal;
