// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job store contract.

use rj_core::{Delivery, JobId, JobRecord, JobStatus, Overrides};

use crate::error::StoreError;

/// Parameters of a freshly submitted job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_id: JobId,
    pub report_name: String,
    pub report_title: Option<String>,
    /// `Submitted` or `Pending`; anything else is stored as `Pending`.
    pub status: JobStatus,
    /// Defaults to the store's clock when unset
    pub job_start_time_ms: Option<u64>,
    pub overrides: Overrides,
    pub delivery: Delivery,
    pub scheduler_job_id: Option<String>,
}

impl NewJob {
    pub fn new(job_id: JobId, report_name: impl Into<String>) -> Self {
        Self {
            job_id,
            report_name: report_name.into(),
            report_title: None,
            status: JobStatus::Pending,
            job_start_time_ms: None,
            overrides: Overrides::new(),
            delivery: Delivery::default(),
            scheduler_job_id: None,
        }
    }

    rj_core::setters! {
        set {
            status: JobStatus,
            overrides: Overrides,
            delivery: Delivery,
        }
        option {
            report_title: String,
            job_start_time_ms: u64,
            scheduler_job_id: String,
        }
    }
}

/// Extra fields written alongside a partial status update.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub error_info: Option<String>,
    pub report_name: Option<String>,
    pub job_start_time_ms: Option<u64>,
}

impl StatusUpdate {
    pub fn error(error_info: impl Into<String>) -> Self {
        Self::default().error_info(error_info)
    }

    rj_core::setters! {
        option {
            error_info: String,
            report_name: String,
            job_start_time_ms: u64,
        }
    }
}

/// Filter for [`JobStore::query`].
///
/// Results are ordered by `update_time` descending. `DELETED` records are
/// excluded unless `include_deleted` is set or `statuses` names `Deleted`.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub report_name: Option<String>,
    pub statuses: Option<Vec<JobStatus>>,
    /// Subset match on override key/values
    pub overrides: Option<Overrides>,
    /// Only records with `update_time > since`
    pub since_ms: Option<u64>,
    /// Only records with `update_time < as_of`
    pub as_of_ms: Option<u64>,
    /// Only records with `job_start_time < started_before`
    pub started_before_ms: Option<u64>,
    pub include_deleted: bool,
    pub limit: Option<usize>,
    /// Hydrate offloaded payload fields from the blob area
    pub load_payload: bool,
}

impl JobQuery {
    pub fn new() -> Self {
        Self::default()
    }

    rj_core::setters! {
        set {
            include_deleted: bool,
            load_payload: bool,
        }
        option {
            report_name: String,
            statuses: Vec<JobStatus>,
            overrides: Overrides,
            since_ms: u64,
            as_of_ms: u64,
            started_before_ms: u64,
            limit: usize,
        }
    }

    /// Whether a record passes every filter except `limit`.
    pub fn matches(&self, record: &JobRecord) -> bool {
        let status = record.status();
        let deleted_requested = self.include_deleted
            || self.statuses.as_ref().is_some_and(|s| s.contains(&JobStatus::Deleted));
        if status == JobStatus::Deleted && !deleted_requested {
            return false;
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&status) {
                return false;
            }
        }
        if let Some(name) = &self.report_name {
            if &record.report_name != name {
                return false;
            }
        }
        if let Some(filter) = &self.overrides {
            if !record.matches_overrides(filter) {
                return false;
            }
        }
        if self.since_ms.is_some_and(|since| record.update_time_ms <= since) {
            return false;
        }
        if self.as_of_ms.is_some_and(|as_of| record.update_time_ms >= as_of) {
            return false;
        }
        if self.started_before_ms.is_some_and(|cutoff| record.job_start_time_ms >= cutoff) {
            return false;
        }
        true
    }
}

/// Result of a delete: the record as it was, and the blobs removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedJob {
    pub record: JobRecord,
    pub blob_names: Vec<String>,
    pub dry_run: bool,
}

/// Durable keyed job metadata with large fields offloaded to a blob area.
///
/// Every mutation is an atomic replace-or-insert of one job's record and
/// advances its `update_time` strictly past every earlier mutation.
pub trait JobStore: Send + Sync + 'static {
    /// Save a submitted/pending record. An id may only be reused once its
    /// previous job is deleted; otherwise [`StoreError::AlreadyExists`].
    fn create_stub(&self, job: NewJob) -> Result<JobRecord, StoreError>;

    /// Partial update of a job's status.
    ///
    /// Rejects `Done` (use [`JobStore::save_result`]) and edges outside the
    /// status graph. Returns `None` when the job is unknown.
    fn update_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        update: StatusUpdate,
    ) -> Result<Option<JobRecord>, StoreError>;

    /// Upsert a finished record, offloading large fields to the blob area.
    /// Returns the stored record, hydrated, with its new `update_time`.
    fn save_result(&self, record: &JobRecord) -> Result<JobRecord, StoreError>;

    /// Append run output lines to a job that is still running.
    fn append_stdout(&self, job_id: &JobId, lines: &[String]) -> Result<(), StoreError>;

    fn get(&self, job_id: &JobId, load_payload: bool) -> Result<Option<JobRecord>, StoreError>;

    fn query(&self, query: &JobQuery) -> Result<Vec<JobRecord>, StoreError>;

    /// Soft-delete: flip to `DELETED` and remove every referenced blob.
    ///
    /// Only finished jobs can be deleted; a submitted or running job is
    /// [`StoreError::IllegalTransition`]. Deleting an already deleted job is
    /// a no-op that returns its snapshot with no blob names. With `dry_run`
    /// nothing is changed.
    fn delete(&self, job_id: &JobId, dry_run: bool) -> Result<Option<DeletedJob>, StoreError>;

    /// Newest job id for a report, optionally narrowed by overrides, status
    /// and an exclusive `as_of` bound on update time.
    fn latest_job_id(
        &self,
        report_name: &str,
        overrides: Option<&Overrides>,
        status: Option<JobStatus>,
        as_of_ms: Option<u64>,
    ) -> Result<Option<JobId>, StoreError> {
        let mut query = JobQuery::new().report_name(report_name).limit(1usize);
        query.overrides = overrides.cloned();
        query.statuses = status.map(|s| vec![s]);
        query.as_of_ms = as_of_ms;
        Ok(self.query(&query)?.into_iter().next().map(|r| r.job_id))
    }

    /// Newest `DONE` job id for each distinct override set of a report.
    fn latest_successful_per_overrides(&self, report_name: &str) -> Result<Vec<JobId>, StoreError> {
        let query =
            JobQuery::new().report_name(report_name).statuses(vec![JobStatus::Done]);
        let mut seen: Vec<Overrides> = Vec::new();
        let mut ids = Vec::new();
        for record in self.query(&query)? {
            if !seen.contains(&record.overrides) {
                seen.push(record.overrides);
                ids.push(record.job_id);
            }
        }
        Ok(ids)
    }

    /// `(report_name, job_id)` pairs, newest first. A limit of 0 means all.
    fn result_keys(&self, limit: usize) -> Result<Vec<(String, JobId)>, StoreError> {
        let mut query = JobQuery::new();
        if limit > 0 {
            query.limit = Some(limit);
        }
        Ok(self.query(&query)?.into_iter().map(|r| (r.report_name, r.job_id)).collect())
    }

    /// Number of jobs that are not deleted.
    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.query(&JobQuery::new())?.len())
    }

    /// Ids of finished, non-deleted jobs started before `cutoff_ms`.
    /// Jobs still submitted or running are left alone.
    fn job_ids_older_than(
        &self,
        cutoff_ms: u64,
        report_name: Option<&str>,
    ) -> Result<Vec<JobId>, StoreError> {
        let mut query = JobQuery::new().started_before_ms(cutoff_ms);
        query.report_name = report_name.map(str::to_string);
        Ok(self
            .query(&query)?
            .into_iter()
            .filter(|r| r.status().is_outcome())
            .map(|r| r.job_id)
            .collect())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
