// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use fs2::FileExt;
use rj_adapters::{CommandWorker, LogMailNotifier, OutputFormat};
use rj_core::SystemClock;
use rj_engine::{
    Coordinator, CoordinatorConfig, Hunter, JobContext, ReadApi, ShutdownSignal,
};
use rj_storage::{CacheBackend, FsCacheBackend, FsJobStore, ReportCache};
use tracing::info;

use super::{Config, Daemon, LifecycleError};

/// Start a daemon that owns the state directory.
///
/// Fails with [`LifecycleError::LockFailed`] while another process holds it.
pub fn startup(config: Config) -> Result<Daemon, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Open without truncating so a failed lock leaves the holder's PID intact
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    build(config, Some(lock_file))
}

/// Open the state directory without taking the lock, for read-only commands.
pub fn attach(config: Config) -> Result<Daemon, LifecycleError> {
    build(config, None)
}

fn build(config: Config, lock_file: Option<File>) -> Result<Daemon, LifecycleError> {
    std::fs::create_dir_all(&config.jobs_path)?;
    std::fs::create_dir_all(&config.cache_path)?;
    std::fs::create_dir_all(&config.logs_path)?;

    let clock = SystemClock;
    let store = FsJobStore::open(&config.jobs_path, clock)?;
    let backend = FsCacheBackend::open(&config.cache_path, clock)?;
    if lock_file.is_some() {
        let purged = backend.purge_expired()?;
        if purged > 0 {
            info!(purged, "purged expired cache entries");
        }
    }
    let cache = ReportCache::new(backend, config.cache_ttl);
    let ctx = JobContext::new(Arc::new(store), Arc::new(cache), clock);

    let format = if config.worker_output_json { OutputFormat::Json } else { OutputFormat::Html };
    let worker = CommandWorker::new(config.worker_command.clone()).format(format);
    let shutdown = ShutdownSignal::new();

    let coordinator = Coordinator::new(
        ctx.clone(),
        worker,
        LogMailNotifier,
        shutdown.clone(),
        CoordinatorConfig::default().cache_ttl(config.cache_ttl),
    );
    let hunter = Hunter::new(ctx.clone(), config.hunter.clone(), shutdown.clone());
    let read = ReadApi::new(ctx.clone()).with_ttl(config.cache_ttl);

    info!(
        state_dir = %config.state_dir.display(),
        worker = %config.worker_command,
        exclusive = lock_file.is_some(),
        "daemon state opened"
    );
    Ok(Daemon {
        config,
        lock_file,
        ctx,
        coordinator: Arc::new(coordinator),
        hunter: Arc::new(hunter),
        read,
        shutdown,
    })
}
