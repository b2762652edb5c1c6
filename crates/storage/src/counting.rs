// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store wrapper that counts calls, for asserting on store traffic in tests.
//! It can also land a finished result just ahead of a status update, the
//! way a coordinator racing the hunter would.

use parking_lot::Mutex;
use std::collections::HashMap;

use rj_core::{JobId, JobRecord, JobStatus};

use crate::error::StoreError;
use crate::store::{DeletedJob, JobQuery, JobStore, NewJob, StatusUpdate};

/// Snapshot of the calls a [`CountingStore`] has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub create_stub: usize,
    pub update_status: usize,
    pub save_result: usize,
    pub append_stdout: usize,
    pub get: usize,
    pub query: usize,
    pub delete: usize,
    /// Statuses passed to `save_result`, per job, in call order
    pub saved: HashMap<JobId, Vec<JobStatus>>,
    /// Statuses passed to `update_status`, per job, in call order
    pub updated: HashMap<JobId, Vec<JobStatus>>,
}

impl StoreCalls {
    /// Number of reads (`get` + `query`).
    pub fn reads(&self) -> usize {
        self.get + self.query
    }

    pub fn saved_statuses(&self, job_id: &str) -> Vec<JobStatus> {
        self.saved.get(job_id).cloned().unwrap_or_default()
    }

    pub fn updated_statuses(&self, job_id: &str) -> Vec<JobStatus> {
        self.updated.get(job_id).cloned().unwrap_or_default()
    }
}

pub struct CountingStore<S: JobStore> {
    inner: S,
    calls: Mutex<StoreCalls>,
    /// Results saved right before the next `update_status` of their job
    racing: Mutex<HashMap<JobId, JobRecord>>,
}

impl<S: JobStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, calls: Mutex::new(StoreCalls::default()), racing: Mutex::new(HashMap::new()) }
    }

    /// Save `record` just before the next status update of its job reaches
    /// the inner store.
    pub fn finish_before_next_update(&self, record: JobRecord) {
        self.racing.lock().insert(record.job_id.clone(), record);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn calls(&self) -> StoreCalls {
        self.calls.lock().clone()
    }

    pub fn reset(&self) {
        *self.calls.lock() = StoreCalls::default();
    }
}

impl<S: JobStore> JobStore for CountingStore<S> {
    fn create_stub(&self, job: NewJob) -> Result<JobRecord, StoreError> {
        self.calls.lock().create_stub += 1;
        self.inner.create_stub(job)
    }

    fn update_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        update: StatusUpdate,
    ) -> Result<Option<JobRecord>, StoreError> {
        {
            let mut calls = self.calls.lock();
            calls.update_status += 1;
            calls.updated.entry(job_id.clone()).or_default().push(status);
        }
        let racing = self.racing.lock().remove(job_id);
        if let Some(record) = racing {
            self.inner.save_result(&record)?;
        }
        self.inner.update_status(job_id, status, update)
    }

    fn save_result(&self, record: &JobRecord) -> Result<JobRecord, StoreError> {
        {
            let mut calls = self.calls.lock();
            calls.save_result += 1;
            calls.saved.entry(record.job_id.clone()).or_default().push(record.status());
        }
        self.inner.save_result(record)
    }

    fn append_stdout(&self, job_id: &JobId, lines: &[String]) -> Result<(), StoreError> {
        self.calls.lock().append_stdout += 1;
        self.inner.append_stdout(job_id, lines)
    }

    fn get(&self, job_id: &JobId, load_payload: bool) -> Result<Option<JobRecord>, StoreError> {
        self.calls.lock().get += 1;
        self.inner.get(job_id, load_payload)
    }

    fn query(&self, query: &JobQuery) -> Result<Vec<JobRecord>, StoreError> {
        self.calls.lock().query += 1;
        self.inner.query(query)
    }

    fn delete(&self, job_id: &JobId, dry_run: bool) -> Result<Option<DeletedJob>, StoreError> {
        self.calls.lock().delete += 1;
        self.inner.delete(job_id, dry_run)
    }
}
