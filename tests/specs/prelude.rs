// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scenario fixtures.

pub use std::time::Duration;

pub use rj_adapters::{ExecutionOutput, FakeMailNotifier, FakeWorker};
pub use rj_core::{FakeClock, JobId, JobStatus, Overrides};
pub use rj_daemon::{attach, startup, Config};
pub use rj_engine::{
    delete_old_reports, Coordinator, CoordinatorConfig, CoordinatorError, Hunter, HunterConfig,
    JobContext, ReadApi, ShutdownSignal, SubmitRequest,
};
pub use rj_storage::{FsJobStore, JobStore, MemoryCacheBackend, NewJob, ReportCache};
pub use rj_wire::StatusResponse;
pub use serde_json::json;
pub use tempfile::TempDir;

use std::sync::Arc;

pub type SpecStore = FsJobStore<FakeClock>;
pub type SpecCache = MemoryCacheBackend<FakeClock>;
pub type SpecContext = JobContext<SpecStore, SpecCache, FakeClock>;

/// Engine wired to a real store on disk, a fake clock and fake adapters.
pub struct Scenario {
    _dir: TempDir,
    pub clock: FakeClock,
    pub ctx: SpecContext,
    pub worker: FakeWorker,
    pub notifier: FakeMailNotifier,
    pub shutdown: ShutdownSignal,
}

impl Scenario {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let clock = FakeClock::new();
        let store = FsJobStore::open(dir.path(), clock.clone()).unwrap();
        let cache = ReportCache::new(MemoryCacheBackend::new(clock.clone()), Duration::from_secs(15));
        let ctx = JobContext::new(Arc::new(store), Arc::new(cache), clock.clone());
        Self {
            _dir: dir,
            clock,
            ctx,
            worker: FakeWorker::new(),
            notifier: FakeMailNotifier::new(),
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn coordinator(
        &self,
    ) -> Coordinator<SpecStore, SpecCache, FakeClock, FakeWorker, FakeMailNotifier> {
        Coordinator::new(
            self.ctx.clone(),
            self.worker.clone(),
            self.notifier.clone(),
            self.shutdown.clone(),
            CoordinatorConfig::default(),
        )
    }

    pub fn hunter(&self) -> Hunter<SpecStore, SpecCache, FakeClock> {
        Hunter::new(self.ctx.clone(), HunterConfig::default(), self.shutdown.clone())
    }

    pub fn read(&self) -> ReadApi<SpecStore, SpecCache, FakeClock> {
        ReadApi::new(self.ctx.clone())
    }

    pub fn stub(&self, id: &str, report: &str, status: JobStatus) {
        self.ctx.store.create_stub(NewJob::new(JobId::new(id), report).status(status)).unwrap();
    }

    pub fn stored(&self, id: &str) -> rj_core::JobRecord {
        self.ctx.store.get(&JobId::new(id), true).unwrap().unwrap()
    }
}

/// Daemon config rooted in `dir` running reports with `worker_command`.
pub fn daemon_config(dir: &TempDir, worker_command: &str) -> Config {
    let mut config = Config::with_defaults(dir.path().join("state"));
    config.worker_command = worker_command.to_string();
    config.shutdown_grace = Duration::ZERO;
    config
}
