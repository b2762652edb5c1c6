// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use rj_core::{JobId, JobRecord};

use super::{CacheBackend, CacheError};

/// Attempts per backend call before the error surfaces.
pub const CACHE_ATTEMPTS: usize = 3;

/// Job snapshots keyed by `(report_name, job_id)`.
pub struct ReportCache<B: CacheBackend> {
    backend: B,
    default_ttl: Duration,
}

impl<B: CacheBackend> ReportCache<B> {
    pub fn new(backend: B, default_ttl: Duration) -> Self {
        Self { backend, default_ttl }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn key(report_name: &str, job_id: &JobId) -> String {
        format!("report_name={}&job_id={}", report_name, job_id)
    }

    /// Cached snapshot of a job. A corrupt entry reads as a miss.
    pub fn get_job(
        &self,
        report_name: &str,
        job_id: &JobId,
    ) -> Result<Option<JobRecord>, CacheError> {
        let key = Self::key(report_name, job_id);
        let Some(bytes) = self.get_raw(&key)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    /// Store a snapshot; `ttl` falls back to the cache default.
    pub fn set_job(&self, record: &JobRecord, ttl: Option<Duration>) -> Result<(), CacheError> {
        let key = Self::key(&record.report_name, &record.job_id);
        let bytes = serde_json::to_vec(record)?;
        self.set_raw(&key, bytes, ttl.unwrap_or(self.default_ttl))
    }

    /// Write `record` only when the cached status differs or nothing is
    /// cached. Returns whether a write happened.
    pub fn refresh_if_changed(
        &self,
        record: &JobRecord,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let cached = self.get_job(&record.report_name, &record.job_id)?;
        if cached.is_some_and(|cached| cached.status() == record.status()) {
            return Ok(false);
        }
        self.set_job(record, ttl)?;
        tracing::debug!(job_id = %record.job_id, status = %record.status(), "refreshed cache");
        Ok(true)
    }

    pub fn invalidate(&self, report_name: &str, job_id: &JobId) -> Result<(), CacheError> {
        let key = Self::key(report_name, job_id);
        self.with_retries("remove", &key, || self.backend.remove(&key))
    }

    /// Drop expired entries from the backend. Returns how many went.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        self.with_retries("purge", "*", || self.backend.purge_expired())
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.with_retries("get", key, || self.backend.get(key))
    }

    pub fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.with_retries("set", key, || self.backend.set(key, value.clone(), ttl))
    }

    fn with_retries<T>(
        &self,
        op: &str,
        key: &str,
        mut call: impl FnMut() -> Result<T, CacheError>,
    ) -> Result<T, CacheError> {
        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < CACHE_ATTEMPTS => {
                    tracing::warn!(op, key, attempt, error = %e, "cache call failed, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(op, key, attempt, error = %e, "cache call failed, giving up");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
