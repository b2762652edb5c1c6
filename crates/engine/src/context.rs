// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use rj_core::Clock;
use rj_storage::{CacheBackend, JobStore, ReportCache};

/// The store, cache and clock every engine component works against.
///
/// Built once at startup and shared by reference.
pub struct JobContext<S: JobStore, B: CacheBackend, C: Clock> {
    pub store: Arc<S>,
    pub cache: Arc<ReportCache<B>>,
    pub clock: C,
}

impl<S: JobStore, B: CacheBackend, C: Clock> JobContext<S, B, C> {
    pub fn new(store: Arc<S>, cache: Arc<ReportCache<B>>, clock: C) -> Self {
        Self { store, cache, clock }
    }
}

impl<S: JobStore, B: CacheBackend, C: Clock> Clone for JobContext<S, B, C> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), cache: Arc::clone(&self.cache), clock: self.clock.clone() }
    }
}
