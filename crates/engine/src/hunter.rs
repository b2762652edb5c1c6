// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background reconciliation of stale jobs.
//!
//! Each iteration times out jobs stuck in `SUBMITTED`/`PENDING`, refreshes the
//! read cache for every job whose record changed since the previous poll, and
//! counts newly seen outcomes. The polling loop also purges expired cache
//! entries every `cache_purge_interval`. Iterations are idempotent: re-running one over
//! the same store state writes nothing and counts nothing twice.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;

use rj_core::{Clock, JobId, JobRecord, JobStatus};
use rj_storage::{CacheBackend, JobQuery, JobStore, StatusUpdate};

use crate::config::HunterConfig;
use crate::context::JobContext;
use crate::counters::OutcomeCounters;
use crate::error::HunterError;
use crate::recency::RecencySet;
use crate::ShutdownSignal;

/// What one iteration did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationReport {
    pub timed_out: Vec<JobId>,
    /// Records updated since the previous poll (lookback included)
    pub changed: usize,
    pub cache_writes: usize,
    pub successes: u64,
    pub failures: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HunterHealth {
    pub last_run_ms: u64,
    pub iterations: u64,
    pub last_error: Option<String>,
}

struct HunterState {
    last_poll_ms: Option<u64>,
    last_purge_ms: Option<u64>,
    seen_done: RecencySet<JobId>,
    seen_error: RecencySet<JobId>,
}

pub struct Hunter<S: JobStore, B: CacheBackend, C: Clock> {
    ctx: JobContext<S, B, C>,
    config: HunterConfig,
    counters: Arc<OutcomeCounters>,
    shutdown: ShutdownSignal,
    state: Mutex<HunterState>,
    health: Mutex<HunterHealth>,
}

impl<S: JobStore, B: CacheBackend, C: Clock> Hunter<S, B, C> {
    pub fn new(ctx: JobContext<S, B, C>, config: HunterConfig, shutdown: ShutdownSignal) -> Self {
        let state = HunterState {
            last_poll_ms: None,
            last_purge_ms: None,
            seen_done: RecencySet::new(config.recent_capacity),
            seen_error: RecencySet::new(config.recent_capacity),
        };
        Self {
            ctx,
            config,
            counters: Arc::new(OutcomeCounters::default()),
            shutdown,
            state: Mutex::new(state),
            health: Mutex::new(HunterHealth::default()),
        }
    }

    pub fn counters(&self) -> Arc<OutcomeCounters> {
        Arc::clone(&self.counters)
    }

    pub fn health(&self) -> HunterHealth {
        self.health.lock().clone()
    }

    /// Run one reconciliation pass.
    pub fn run_once(&self) -> Result<IterationReport, HunterError> {
        let started_ms = self.ctx.clock.epoch_ms();
        let mut report = IterationReport {
            timed_out: self.time_out_stale(started_ms)?,
            ..Default::default()
        };

        let mut state = self.state.lock();
        let lookback_ms = self.config.effective_lookback().as_millis() as u64;
        let mut query = JobQuery::new().include_deleted(true);
        query.since_ms = state.last_poll_ms.map(|last| last.saturating_sub(lookback_ms));

        let changed = self.ctx.store.query(&query)?;
        report.changed = changed.len();
        for record in &changed {
            if self.refresh_cache(record)? {
                report.cache_writes += 1;
            }
            match record.status() {
                JobStatus::Done if state.seen_done.insert(record.job_id.clone()) => {
                    self.counters.record_success();
                    report.successes += 1;
                }
                JobStatus::Error if state.seen_error.insert(record.job_id.clone()) => {
                    self.counters.record_failure();
                    report.failures += 1;
                }
                _ => {}
            }
        }
        state.last_poll_ms = Some(started_ms);

        if !report.timed_out.is_empty() || report.cache_writes > 0 {
            tracing::info!(
                timed_out = report.timed_out.len(),
                changed = report.changed,
                cache_writes = report.cache_writes,
                "hunter iteration"
            );
        }
        Ok(report)
    }

    /// Mark jobs that outlived their status's timeout as `TIMEOUT`.
    fn time_out_stale(&self, now_ms: u64) -> Result<Vec<JobId>, HunterError> {
        let active =
            self.ctx.store.query(&JobQuery::new().statuses(JobStatus::ACTIVE.to_vec()))?;
        let mut timed_out = Vec::new();
        for record in active {
            let (limit, message) = match record.status() {
                JobStatus::Submitted => (
                    self.config.submission_timeout,
                    "This request timed out while being submitted to run.",
                ),
                JobStatus::Pending => {
                    (self.config.running_timeout, "This report timed out while running.")
                }
                _ => continue,
            };
            let elapsed = Duration::from_millis(now_ms.saturating_sub(record.job_start_time_ms));
            if elapsed < limit {
                continue;
            }

            // Reported time is how far past the deadline the job got
            let overage_secs = (elapsed - limit).as_secs();
            let error_info = format!(
                "{message} Please try again! Timed out after {} minutes {} seconds.",
                overage_secs / 60,
                overage_secs % 60
            );
            match self.ctx.store.update_status(
                &record.job_id,
                JobStatus::Timeout,
                StatusUpdate::error(error_info),
            ) {
                Ok(Some(_)) => {
                    tracing::warn!(
                        job_id = %record.job_id,
                        report = %record.report_name,
                        from = %record.status(),
                        elapsed_secs = elapsed.as_secs(),
                        overage_secs,
                        "job timed out"
                    );
                    self.counters.record_timeout();
                    timed_out.push(record.job_id);
                }
                Ok(None) => {}
                // Finished (or went away) since the query; leave it be
                Err(e) => {
                    tracing::warn!(job_id = %record.job_id, error = %e, "failed to time out job");
                }
            }
        }
        Ok(timed_out)
    }

    /// Write the full record to the cache when its cached status is stale.
    fn refresh_cache(&self, record: &JobRecord) -> Result<bool, HunterError> {
        let cached = self.ctx.cache.get_job(&record.report_name, &record.job_id)?;
        if cached.is_some_and(|cached| cached.status() == record.status()) {
            return Ok(false);
        }
        let Some(full) = self.ctx.store.get(&record.job_id, true)? else {
            return Ok(false);
        };
        self.ctx.cache.set_job(&full, Some(self.config.cache_ttl))?;
        tracing::debug!(job_id = %full.job_id, status = %full.status(), "hunter refreshed cache");
        Ok(true)
    }

    /// Drop expired cache entries once per purge interval. Failures are only
    /// logged.
    fn purge_cache_if_due(&self, now_ms: u64) {
        let interval_ms = self.config.cache_purge_interval.as_millis() as u64;
        {
            let mut state = self.state.lock();
            if state.last_purge_ms.is_some_and(|last| now_ms.saturating_sub(last) < interval_ms) {
                return;
            }
            state.last_purge_ms = Some(now_ms);
        }
        match self.ctx.cache.purge_expired() {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "purged expired cache entries"),
            Err(e) => tracing::warn!(error = %e, "failed to purge expired cache entries"),
        }
    }

    /// One iteration with health bookkeeping. Errors are only propagated in
    /// strict mode.
    pub fn tick(&self) -> Result<(), HunterError> {
        self.purge_cache_if_due(self.ctx.clock.epoch_ms());
        let result = self.run_once();
        let mut health = self.health.lock();
        health.last_run_ms = self.ctx.clock.epoch_ms();
        health.iterations += 1;
        match result {
            Ok(_) => {
                health.last_error = None;
                Ok(())
            }
            Err(e) => {
                health.last_error = Some(e.to_string());
                if self.config.strict {
                    return Err(e);
                }
                tracing::warn!(error = %e, "hunter iteration failed");
                Ok(())
            }
        }
    }
}

impl<S: JobStore, B: CacheBackend, C: Clock> Hunter<S, B, C> {
    /// Spawn the polling loop. It stops when the handle is stopped or the
    /// shutdown signal trips.
    pub fn start(self: Arc<Self>) -> HunterHandle {
        let cancel = self.shutdown.child_token();
        let token = cancel.clone();
        let poll_interval = self.config.poll_interval;
        tracing::info!(poll_ms = poll_interval.as_millis() as u64, "starting hunter");

        let task = tokio::spawn(async move {
            loop {
                if let Err(e) = self.tick() {
                    tracing::error!(error = %e, "hunter stopped on error");
                    break;
                }
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
            tracing::info!("hunter stopped");
        });
        HunterHandle { cancel, task }
    }
}

/// Running hunter loop.
pub struct HunterHandle {
    cancel: ShutdownSignal,
    task: JoinHandle<()>,
}

impl HunterHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait for the in-flight iteration to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "hunter task did not exit cleanly");
        }
    }
}

#[cfg(test)]
#[path = "hunter_tests.rs"]
mod tests;
