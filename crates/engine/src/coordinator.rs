// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution coordinator: drives one job through
//! `SUBMITTED -> PENDING -> {DONE | ERROR}`, retrying failed attempts under
//! the same job id.

use rj_adapters::{
    ExecutionError, ExecutionOutput, ExecutionRequest, ExecutionWorker, MailMessage, MailNotifier,
    ProgressSink,
};
use rj_core::{
    Clock, Delivery, JobId, JobRecord, JobState, JobStatus, Overrides, CANCEL_MESSAGE,
};
use rj_storage::{CacheBackend, JobQuery, JobStore, NewJob, StatusUpdate};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::CoordinatorConfig;
use crate::context::JobContext;
use crate::error::CoordinatorError;
use crate::ShutdownSignal;

/// A job submission, from a user or a trigger source.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Generated when unset
    pub job_id: Option<JobId>,
    pub report_name: String,
    pub report_title: Option<String>,
    pub overrides: Overrides,
    pub delivery: Delivery,
    /// Extra attempts after the first failure
    pub n_retries: u32,
    pub scheduler_job_id: Option<String>,
}

impl SubmitRequest {
    pub fn new(report_name: impl Into<String>) -> Self {
        Self {
            job_id: None,
            report_name: report_name.into(),
            report_title: None,
            overrides: Overrides::new(),
            delivery: Delivery::default(),
            n_retries: 0,
            scheduler_job_id: None,
        }
    }

    rj_core::setters! {
        set {
            overrides: Overrides,
            delivery: Delivery,
            n_retries: u32,
        }
        option {
            job_id: JobId,
            report_title: String,
            scheduler_job_id: String,
        }
    }
}

pub struct Coordinator<S, B, C, W, N>
where
    S: JobStore,
    B: CacheBackend,
    C: Clock,
    W: ExecutionWorker,
    N: MailNotifier,
{
    ctx: JobContext<S, B, C>,
    worker: W,
    notifier: N,
    shutdown: ShutdownSignal,
    config: CoordinatorConfig,
}

impl<S, B, C, W, N> Coordinator<S, B, C, W, N>
where
    S: JobStore,
    B: CacheBackend,
    C: Clock,
    W: ExecutionWorker,
    N: MailNotifier,
{
    pub fn new(
        ctx: JobContext<S, B, C>,
        worker: W,
        notifier: N,
        shutdown: ShutdownSignal,
        config: CoordinatorConfig,
    ) -> Self {
        Self { ctx, worker, notifier, shutdown, config }
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Save a `SUBMITTED` stub for the request and run it to completion.
    pub async fn submit(&self, request: SubmitRequest) -> Result<JobRecord, CoordinatorError> {
        let job_id = request.job_id.unwrap_or_else(JobId::generate);
        let mut job = NewJob::new(job_id, request.report_name)
            .status(JobStatus::Submitted)
            .overrides(request.overrides)
            .delivery(request.delivery);
        job.report_title = request.report_title;
        job.scheduler_job_id = request.scheduler_job_id;

        let stub = self.ctx.store.create_stub(job)?;
        self.cache_snapshot(&stub);
        tracing::info!(
            job_id = %stub.job_id,
            report = %stub.report_name,
            n_retries = request.n_retries,
            "job submitted"
        );
        self.start(&stub, request.n_retries).await
    }

    /// Run the job described by `job`, retrying up to `retries_remaining`
    /// more times after a failure.
    ///
    /// With the shutdown signal tripped the job is cancelled instead and the
    /// worker is never called. When every attempt fails the last failure is
    /// persisted and returned as [`CoordinatorError::Execution`].
    pub async fn start(
        &self,
        job: &JobRecord,
        mut retries_remaining: u32,
    ) -> Result<JobRecord, CoordinatorError> {
        let job_id = &job.job_id;
        if self.shutdown.is_cancelled() {
            tracing::info!(job_id = %job_id, "shutting down, cancelling job instead of running it");
            let cancelled = self
                .ctx
                .store
                .update_status(job_id, JobStatus::Cancelled, StatusUpdate::error(CANCEL_MESSAGE))?
                .ok_or_else(|| CoordinatorError::UnknownJob { job_id: job_id.clone() })?;
            self.cache_snapshot(&cancelled);
            return Ok(cancelled);
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let update = StatusUpdate::default()
                .report_name(job.report_name.clone())
                .job_start_time_ms(job.job_start_time_ms);
            let running = self
                .ctx
                .store
                .update_status(job_id, JobStatus::Pending, update)?
                .ok_or_else(|| CoordinatorError::UnknownJob { job_id: job_id.clone() })?;
            self.cache_snapshot(&running);

            tracing::info!(
                job_id = %job_id,
                report = %job.report_name,
                attempt = attempts,
                retries_remaining,
                "running report"
            );
            let (outcome, lines) = self.execute(job).await;

            match outcome {
                Ok(output) => {
                    let saved = self.save_done(job, output, lines)?;
                    self.notify(&saved).await;
                    return Ok(saved);
                }
                Err(e) => {
                    let diagnostic = e.diagnostic();
                    tracing::error!(
                        job_id = %job_id,
                        report = %job.report_name,
                        attempt = attempts,
                        error = %diagnostic,
                        "report run failed"
                    );
                    let mut failed = job.clone();
                    failed.state = JobState::Error { error_info: diagnostic.clone() };
                    failed.stdout = lines;
                    let saved = self.ctx.store.save_result(&failed)?;
                    self.cache_snapshot(&saved);

                    if retries_remaining > 0 && !self.shutdown.is_cancelled() {
                        retries_remaining -= 1;
                        tracing::info!(job_id = %job_id, retries_remaining, "retrying report");
                        continue;
                    }

                    tracing::warn!(job_id = %job_id, attempts, "giving up on report");
                    self.notify(&saved).await;
                    return Err(CoordinatorError::Execution {
                        job_id: job_id.clone(),
                        attempts,
                        diagnostic,
                    });
                }
            }
        }
    }

    /// Call the worker, appending streamed output lines to the stored record
    /// in batches.
    async fn execute(
        &self,
        job: &JobRecord,
    ) -> (Result<ExecutionOutput, ExecutionError>, Vec<String>) {
        let request = ExecutionRequest {
            job_id: job.job_id.clone(),
            report_name: job.report_name.clone(),
            report_title: job.report_title.clone(),
            overrides: job.overrides.clone(),
            generate_pdf: job.delivery.generate_pdf_output,
            hide_code: job.delivery.hide_code,
        };
        let (sink, mut rx) = ProgressSink::channel();
        let mut lines = Vec::new();
        let mut pending = Vec::new();
        let period = self.config.stdout_flush_interval.max(Duration::from_millis(1));
        let mut flush_tick = tokio::time::interval_at(Instant::now() + period, period);
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let execution = self.worker.execute(&request, sink);
        tokio::pin!(execution);
        let outcome = loop {
            tokio::select! {
                outcome = &mut execution => break outcome,
                Some(line) = rx.recv() => {
                    pending.push(line.clone());
                    lines.push(line);
                    if pending.len() >= self.config.stdout_batch_lines {
                        self.flush_output(&job.job_id, &mut pending).await;
                    }
                }
                _ = flush_tick.tick() => self.flush_output(&job.job_id, &mut pending).await,
            }
        };
        // The saved result carries every line, buffered ones included
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        (outcome, lines)
    }

    /// Append buffered output lines off the runtime thread.
    async fn flush_output(&self, job_id: &JobId, pending: &mut Vec<String>) {
        if pending.is_empty() {
            return;
        }
        let batch = std::mem::take(pending);
        let count = batch.len();
        let store = Arc::clone(&self.ctx.store);
        let id = job_id.clone();
        match tokio::task::spawn_blocking(move || store.append_stdout(&id, &batch)).await {
            Ok(Ok(())) => tracing::trace!(job_id = %job_id, lines = count, "recorded run output"),
            Ok(Err(e)) => {
                tracing::warn!(job_id = %job_id, error = %e, "failed to record run output")
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "run output writer did not finish")
            }
        }
    }

    fn save_done(
        &self,
        job: &JobRecord,
        output: ExecutionOutput,
        lines: Vec<String>,
    ) -> Result<JobRecord, CoordinatorError> {
        let (run, stdout) = output.into_run(self.ctx.clock.epoch_ms());
        let mut done = job.clone();
        done.state = JobState::Done(run);
        done.stdout = if stdout.is_empty() { lines } else { stdout };
        let saved = self.ctx.store.save_result(&done)?;
        self.cache_snapshot(&saved);
        tracing::info!(
            job_id = %saved.job_id,
            report = %saved.report_name,
            duration_ms = saved.job_finish_time_ms().unwrap_or(0).saturating_sub(saved.job_start_time_ms),
            "report done"
        );
        Ok(saved)
    }

    /// Mail the outcome when the job has recipients. Failures are only logged.
    async fn notify(&self, record: &JobRecord) {
        let Some(message) = MailMessage::for_record(record) else {
            return;
        };
        if let Err(e) = self.notifier.notify(&message).await {
            tracing::warn!(job_id = %record.job_id, error = %e, "failed to send outcome mail");
        }
    }

    fn cache_snapshot(&self, record: &JobRecord) {
        if let Err(e) = self.ctx.cache.set_job(record, Some(self.config.cache_ttl)) {
            tracing::warn!(job_id = %record.job_id, error = %e, "failed to cache job snapshot");
        }
    }

    /// Mark every `SUBMITTED`/`PENDING` job `CANCELLED`. Returns how many were.
    pub fn cancel_all_jobs(&self) -> Result<usize, CoordinatorError> {
        let active =
            self.ctx.store.query(&JobQuery::new().statuses(JobStatus::ACTIVE.to_vec()))?;
        let mut cancelled = 0;
        for record in active {
            match self.ctx.store.update_status(
                &record.job_id,
                JobStatus::Cancelled,
                StatusUpdate::error(CANCEL_MESSAGE),
            ) {
                Ok(Some(updated)) => {
                    self.cache_snapshot(&updated);
                    cancelled += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(job_id = %record.job_id, error = %e, "failed to cancel job");
                }
            }
        }
        tracing::info!(cancelled, "cancelled active jobs");
        Ok(cancelled)
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
