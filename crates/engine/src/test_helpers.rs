// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use std::sync::Arc;
use std::time::Duration;

use rj_adapters::{FakeMailNotifier, FakeWorker};
use rj_core::FakeClock;
use rj_storage::{CountingStore, FsJobStore, MemoryCacheBackend, ReportCache};
use tempfile::TempDir;

use crate::{Coordinator, CoordinatorConfig, Hunter, HunterConfig, JobContext, ShutdownSignal};

pub(crate) type TestStore = CountingStore<FsJobStore<FakeClock>>;
pub(crate) type TestCache = MemoryCacheBackend<FakeClock>;
pub(crate) type TestContext = JobContext<TestStore, TestCache, FakeClock>;
pub(crate) type TestCoordinator =
    Coordinator<TestStore, TestCache, FakeClock, FakeWorker, FakeMailNotifier>;

pub(crate) struct TestEnv {
    _dir: TempDir,
    pub clock: FakeClock,
    pub ctx: TestContext,
    pub worker: FakeWorker,
    pub notifier: FakeMailNotifier,
    pub shutdown: ShutdownSignal,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let clock = FakeClock::new();
        let store = FsJobStore::open(dir.path(), clock.clone()).unwrap();
        let cache = ReportCache::new(MemoryCacheBackend::new(clock.clone()), Duration::from_secs(15));
        let ctx = JobContext::new(Arc::new(CountingStore::new(store)), Arc::new(cache), clock.clone());
        Self {
            _dir: dir,
            clock,
            ctx,
            worker: FakeWorker::new(),
            notifier: FakeMailNotifier::new(),
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn store(&self) -> &TestStore {
        &self.ctx.store
    }

    pub fn cache(&self) -> &ReportCache<TestCache> {
        &self.ctx.cache
    }

    pub fn coordinator(&self) -> TestCoordinator {
        self.coordinator_with(CoordinatorConfig::default())
    }

    pub fn coordinator_with(&self, config: CoordinatorConfig) -> TestCoordinator {
        Coordinator::new(
            self.ctx.clone(),
            self.worker.clone(),
            self.notifier.clone(),
            self.shutdown.clone(),
            config,
        )
    }

    pub fn hunter(&self, config: HunterConfig) -> Hunter<TestStore, TestCache, FakeClock> {
        Hunter::new(self.ctx.clone(), config, self.shutdown.clone())
    }
}
