// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

mod startup;
pub use startup::{attach, startup};

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rj_adapters::{CommandWorker, LogMailNotifier};
use rj_core::SystemClock;
use rj_engine::{
    Coordinator, CoordinatorError, Hunter, HunterConfig, HunterHandle, JobContext, ReadApi,
    ShutdownSignal,
};
use rj_storage::{CacheError, FsCacheBackend, FsJobStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};

pub type DaemonStore = FsJobStore<SystemClock>;
pub type DaemonCache = FsCacheBackend<SystemClock>;
pub type DaemonContext = JobContext<DaemonStore, DaemonCache, SystemClock>;
pub type DaemonCoordinator =
    Coordinator<DaemonStore, DaemonCache, SystemClock, CommandWorker, LogMailNotifier>;
pub type DaemonHunter = Hunter<DaemonStore, DaemonCache, SystemClock>;
pub type DaemonReadApi = ReadApi<DaemonStore, DaemonCache, SystemClock>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/rj)
    pub state_dir: PathBuf,
    /// Job store root: metadata checkpoint and blob area
    pub jobs_path: PathBuf,
    /// Read cache entries
    pub cache_path: PathBuf,
    /// Daemon log files
    pub logs_path: PathBuf,
    /// Exclusive lock held while a process mutates the store
    pub lock_path: PathBuf,
    pub worker_command: String,
    pub worker_output_json: bool,
    pub hunter: HunterConfig,
    /// TTL of snapshots written on the read and run paths
    pub cache_ttl: Duration,
    pub result_limit: usize,
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::from_env(crate::env::state_dir()?))
    }

    /// Environment-driven configuration rooted at `state_dir`.
    pub fn from_env(state_dir: PathBuf) -> Self {
        let hunter = HunterConfig::default()
            .poll_interval(crate::env::hunter_poll())
            .submission_timeout(crate::env::submission_timeout())
            .running_timeout(crate::env::running_timeout());
        Self {
            worker_command: crate::env::worker_command(),
            worker_output_json: crate::env::worker_output_json(),
            hunter,
            cache_ttl: crate::env::cache_ttl(),
            result_limit: crate::env::result_limit(),
            shutdown_grace: crate::env::shutdown_grace(),
            ..Self::with_defaults(state_dir)
        }
    }

    /// Built-in defaults rooted at `state_dir`, ignoring the environment.
    pub fn with_defaults(state_dir: PathBuf) -> Self {
        Self {
            jobs_path: state_dir.join("jobs"),
            cache_path: state_dir.join("cache"),
            logs_path: state_dir.join("logs"),
            lock_path: state_dir.join("rjd.lock"),
            state_dir,
            worker_command: crate::env::DEFAULT_WORKER_COMMAND.to_string(),
            worker_output_json: false,
            hunter: HunterConfig::default(),
            cache_ttl: Duration::from_secs(15),
            result_limit: 100,
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

/// A started daemon: the store, cache and engine components wired together.
pub struct Daemon {
    pub config: Config,
    // Holds the exclusive lock; released on drop
    lock_file: Option<File>,
    pub ctx: DaemonContext,
    pub coordinator: Arc<DaemonCoordinator>,
    pub hunter: Arc<DaemonHunter>,
    pub read: DaemonReadApi,
    pub shutdown: ShutdownSignal,
}

impl Daemon {
    /// Start the hunter loop.
    pub fn start_hunter(&self) -> HunterHandle {
        Arc::clone(&self.hunter).start()
    }

    /// Shut down gracefully.
    ///
    /// Trips the shutdown signal, cancels every active job, joins the hunter
    /// and, when anything was cancelled, waits out the grace delay so pollers
    /// observe the cancellation.
    pub async fn shutdown(self, hunter: Option<HunterHandle>) -> Result<usize, LifecycleError> {
        info!("shutting down");
        self.shutdown.cancel();

        let cancelled = self.coordinator.cancel_all_jobs()?;
        if let Some(hunter) = hunter {
            hunter.stop().await;
        }
        if cancelled > 0 {
            tokio::time::sleep(self.config.shutdown_grace).await;
        }

        if self.lock_file.is_some() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!(error = %e, "failed to remove lock file");
            }
        }
        info!(cancelled, "shutdown complete");
        Ok(cancelled)
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: another rjd process is using this state directory")]
    LockFailed(#[source] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("engine error: {0}")]
    Coordinator(#[from] CoordinatorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
