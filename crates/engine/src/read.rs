// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache-first job lookups for status polling and result pages.
//!
//! Reads never fail: a missing job, or a store error, comes back as an
//! error-shaped record so callers always receive the same shape.

use std::time::Duration;

use rj_core::{Clock, JobId, JobRecord, JobStatus, Overrides};
use rj_storage::{CacheBackend, JobQuery, JobStore};
use rj_wire::{StatusResponse, JOB_NOT_FOUND, NOT_FOUND_FOR_OVERRIDES};

use crate::config::DEFAULT_CACHE_TTL;
use crate::context::JobContext;

pub struct ReadApi<S: JobStore, B: CacheBackend, C: Clock> {
    ctx: JobContext<S, B, C>,
    ttl: Duration,
}

impl<S: JobStore, B: CacheBackend, C: Clock> ReadApi<S, B, C> {
    pub fn new(ctx: JobContext<S, B, C>) -> Self {
        Self { ctx, ttl: DEFAULT_CACHE_TTL }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Full record for a job, from the cache when possible.
    ///
    /// On a miss (or with `ignore_cache`) the store is read and the cache is
    /// refreshed when its status was stale.
    pub fn get_job(&self, job_id: &JobId, report_name: &str, ignore_cache: bool) -> JobRecord {
        if !ignore_cache {
            match self.ctx.cache.get_job(report_name, job_id) {
                Ok(Some(cached)) => return cached,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(job_id = %job_id, error = %e, "cache read failed, using store");
                }
            }
        }

        match self.ctx.store.get(job_id, true) {
            Ok(Some(record)) => {
                self.refresh_cache(&record);
                record
            }
            Ok(None) => {
                self.not_found(job_id.clone(), report_name, Overrides::new(), "Job not found")
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "job lookup failed");
                self.not_found(job_id.clone(), report_name, Overrides::new(), e.to_string())
            }
        }
    }

    /// Newest job of a report, optionally narrowed by overrides, an exclusive
    /// `as_of` bound on update time, and success.
    pub fn get_latest(
        &self,
        report_name: &str,
        overrides: Option<&Overrides>,
        as_of_ms: Option<u64>,
        successful_only: bool,
    ) -> JobRecord {
        let status = successful_only.then_some(JobStatus::Done);
        match self.ctx.store.latest_job_id(report_name, overrides, status, as_of_ms) {
            Ok(Some(job_id)) => self.get_job(&job_id, report_name, false),
            Ok(None) => self.not_found(
                JobId::new(""),
                report_name,
                overrides.cloned().unwrap_or_default(),
                NOT_FOUND_FOR_OVERRIDES,
            ),
            Err(e) => {
                tracing::error!(report = %report_name, error = %e, "latest job lookup failed");
                self.not_found(
                    JobId::new(""),
                    report_name,
                    overrides.cloned().unwrap_or_default(),
                    e.to_string(),
                )
            }
        }
    }

    /// Newest successful job for every distinct override set of a report.
    pub fn get_latest_successful_all_params(&self, report_name: &str) -> Vec<JobRecord> {
        match self.ctx.store.latest_successful_per_overrides(report_name) {
            Ok(ids) => ids.iter().map(|id| self.get_job(id, report_name, false)).collect(),
            Err(e) => {
                tracing::error!(report = %report_name, error = %e, "latest results lookup failed");
                Vec::new()
            }
        }
    }

    /// Poll response for one job. Always reads through to the store.
    ///
    /// An id the store has never seen gets a bare status with no results
    /// link.
    pub fn status(&self, report_name: &str, job_id: &JobId) -> StatusResponse {
        match self.ctx.store.get(job_id, true) {
            Ok(Some(record)) => {
                self.refresh_cache(&record);
                StatusResponse::from_record(&record)
            }
            Ok(None) => {
                tracing::debug!(job_id = %job_id, report = %report_name, "polled unknown job");
                StatusResponse::missing(JOB_NOT_FOUND)
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "job lookup failed");
                StatusResponse::missing(e.to_string())
            }
        }
    }

    fn refresh_cache(&self, record: &JobRecord) {
        if let Err(e) = self.ctx.cache.refresh_if_changed(record, Some(self.ttl)) {
            tracing::warn!(job_id = %record.job_id, error = %e, "failed to refresh cache");
        }
    }

    /// Poll response for the newest job of a report with `overrides`.
    pub fn status_latest(&self, report_name: &str, overrides: &Overrides) -> StatusResponse {
        match self.ctx.store.latest_job_id(report_name, Some(overrides), None, None) {
            Ok(Some(job_id)) => self.status(report_name, &job_id),
            Ok(None) => StatusResponse::missing(NOT_FOUND_FOR_OVERRIDES),
            Err(e) => {
                tracing::error!(report = %report_name, error = %e, "latest job lookup failed");
                StatusResponse::missing(e.to_string())
            }
        }
    }

    /// Newest jobs, optionally for a single report, without payloads.
    pub fn recent(&self, report_name: Option<&str>, limit: usize) -> Vec<JobRecord> {
        let mut query = JobQuery::new().limit(limit);
        query.report_name = report_name.map(str::to_string);
        self.ctx.store.query(&query).unwrap_or_else(|e| {
            tracing::error!(error = %e, "recent jobs lookup failed");
            Vec::new()
        })
    }

    fn not_found(
        &self,
        job_id: JobId,
        report_name: &str,
        overrides: Overrides,
        message: impl Into<String>,
    ) -> JobRecord {
        JobRecord::not_found(job_id, report_name, overrides, message, self.ctx.clock.epoch_ms())
    }
}

#[cfg(test)]
#[path = "read_tests.rs"]
mod tests;
