// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed [`JobStore`].
//!
//! Layout under the store root:
//!
//! ```text
//! jobs.json.zst   checkpoint of every job's metadata
//! blobs/          offloaded payload fields, one file per blob name
//! ```
//!
//! Metadata lives in memory behind a mutex and is checkpointed after every
//! mutation. Payload fields (HTML, PDF, stdout, error text...) are written to
//! the blob area before the metadata that references them, so a reader never
//! sees a reference to a blob that was not yet written.
//!
//! Output streamed by a running job goes to an append-only `run-output`
//! blob. Only the first append checkpoints (to reference the blob); later
//! appends touch the blob file alone.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rj_core::{Clock, JobId, JobRecord, JobState, JobStatus};

use crate::blob::{BlobArea, BlobKind};
use crate::checkpoint::Checkpoint;
use crate::error::StoreError;
use crate::store::{DeletedJob, JobQuery, JobStore, NewJob, StatusUpdate};

const CHECKPOINT_FILE: &str = "jobs.json.zst";
const BLOB_DIR: &str = "blobs";

/// A job's metadata with payload fields stripped, plus the blobs holding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredJob {
    record: JobRecord,
    #[serde(default)]
    blobs: Vec<BlobKind>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Table {
    jobs: HashMap<JobId, StoredJob>,
    /// Last `update_time` handed out
    last_update_ms: u64,
}

pub struct FsJobStore<C: Clock> {
    table: Mutex<Table>,
    blobs: BlobArea,
    checkpoint_path: PathBuf,
    clock: C,
}

impl<C: Clock> FsJobStore<C> {
    /// Open the store rooted at `root`, loading any existing checkpoint.
    pub fn open(root: impl AsRef<Path>, clock: C) -> Result<Self, StoreError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let checkpoint_path = root.join(CHECKPOINT_FILE);
        let blobs = BlobArea::open(root.join(BLOB_DIR))?;

        let table = match Checkpoint::<Table>::load(&checkpoint_path)? {
            Some(checkpoint) => {
                tracing::info!(
                    jobs = checkpoint.data.jobs.len(),
                    created_at = %checkpoint.created_at,
                    "loaded job store checkpoint"
                );
                checkpoint.data
            }
            None => Table::default(),
        };

        Ok(Self { table: Mutex::new(table), blobs, checkpoint_path, clock })
    }

    pub fn blob_area(&self) -> &BlobArea {
        &self.blobs
    }

    /// Next `update_time`: the clock, bumped past the last one handed out.
    fn next_update_ms(&self, table: &mut Table) -> u64 {
        let now = self.clock.epoch_ms().max(table.last_update_ms + 1);
        table.last_update_ms = now;
        now
    }

    /// Insert `entry` and persist; on failure the previous entry is restored.
    fn commit(&self, table: &mut Table, entry: StoredJob) -> Result<(), StoreError> {
        let key = entry.record.job_id.clone();
        let previous = table.jobs.insert(key.clone(), entry);
        if let Err(e) = Checkpoint::new(&*table).write(&self.checkpoint_path) {
            match previous {
                Some(previous) => table.jobs.insert(key, previous),
                None => table.jobs.remove(&key),
            };
            return Err(e.into());
        }
        Ok(())
    }

    fn put_blob(
        &self,
        job_id: &JobId,
        kind: BlobKind,
        bytes: &[u8],
        written: &mut Vec<BlobKind>,
    ) -> Result<(), StoreError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.blobs.put(&kind.blob_name(job_id), bytes)?;
        written.push(kind);
        Ok(())
    }

    /// Write non-empty payload fields to the blob area and strip them from
    /// the record.
    fn offload(&self, mut record: JobRecord) -> Result<StoredJob, StoreError> {
        let id = record.job_id.clone();
        let mut written = Vec::new();

        if !record.stdout.is_empty() {
            let lines = serde_json::to_vec(&std::mem::take(&mut record.stdout))?;
            self.put_blob(&id, BlobKind::Stdout, &lines, &mut written)?;
        }

        match &mut record.state {
            JobState::Done(run) => {
                let fields = [
                    (BlobKind::Html, std::mem::take(&mut run.raw_html).into_bytes()),
                    (BlobKind::EmailHtml, std::mem::take(&mut run.email_html).into_bytes()),
                    (BlobKind::RawDocument, std::mem::take(&mut run.raw_document).into_bytes()),
                    (BlobKind::CssInlining, std::mem::take(&mut run.css_inlining).into_bytes()),
                    (BlobKind::Pdf, std::mem::take(&mut run.pdf)),
                ];
                for (kind, bytes) in fields {
                    self.put_blob(&id, kind, &bytes, &mut written)?;
                }
            }
            state => {
                if let Some(info) = state.error_info_mut() {
                    let info = std::mem::take(info);
                    self.put_blob(&id, BlobKind::ErrorInfo, info.as_bytes(), &mut written)?;
                }
            }
        }

        Ok(StoredJob { record, blobs: written })
    }

    /// Rebuild the full record, reading offloaded fields back in.
    ///
    /// A missing or unreadable blob leaves its field empty.
    fn hydrate(&self, stored: &StoredJob, load_payload: bool) -> JobRecord {
        let mut record = stored.record.clone();
        if !load_payload {
            return record;
        }
        for &kind in &stored.blobs {
            let name = kind.blob_name(&record.job_id);
            let bytes = match self.blobs.get(&name) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    tracing::warn!(blob = %name, "referenced blob is missing, leaving field empty");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(blob = %name, error = %e, "failed to read blob, leaving field empty");
                    continue;
                }
            };
            fill(&mut record, kind, bytes);
        }
        record
    }

    fn remove_blobs(&self, job_id: &JobId, kinds: &[BlobKind]) {
        for kind in kinds {
            let name = kind.blob_name(job_id);
            if let Err(e) = self.blobs.remove(&name) {
                tracing::warn!(blob = %name, error = %e, "failed to remove blob");
            }
        }
    }

    fn delete_locked(
        &self,
        table: &mut Table,
        job_id: &JobId,
        dry_run: bool,
    ) -> Result<Option<DeletedJob>, StoreError> {
        let Some(stored) = table.jobs.get(job_id).cloned() else {
            return Ok(None);
        };
        let snapshot = self.hydrate(&stored, true);

        let from = stored.record.status();
        if from == JobStatus::Deleted {
            return Ok(Some(DeletedJob { record: snapshot, blob_names: Vec::new(), dry_run }));
        }
        if !from.can_transition_to(JobStatus::Deleted) {
            return Err(StoreError::IllegalTransition {
                job_id: job_id.clone(),
                from,
                to: JobStatus::Deleted,
            });
        }

        let blob_names: Vec<String> =
            stored.blobs.iter().map(|kind| kind.blob_name(job_id)).collect();
        if dry_run {
            tracing::info!(job_id = %job_id, blobs = blob_names.len(), "dry run: would delete job");
            return Ok(Some(DeletedJob { record: snapshot, blob_names, dry_run }));
        }

        let mut entry = stored.clone();
        entry.record.state = JobState::Deleted;
        entry.record.stdout.clear();
        entry.blobs.clear();
        entry.record.update_time_ms = self.next_update_ms(table);
        self.commit(table, entry)?;
        self.remove_blobs(job_id, &stored.blobs);

        tracing::info!(job_id = %job_id, blobs = blob_names.len(), "deleted job");
        Ok(Some(DeletedJob { record: snapshot, blob_names, dry_run }))
    }
}

/// Put blob contents back into the field they were taken from.
fn fill(record: &mut JobRecord, kind: BlobKind, bytes: Vec<u8>) {
    let text = |bytes: Vec<u8>| match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    match (kind, &mut record.state) {
        (BlobKind::Stdout, _) => match serde_json::from_slice(&bytes) {
            Ok(lines) => record.stdout = lines,
            Err(e) => {
                tracing::warn!(job_id = %record.job_id, error = %e, "corrupt stdout blob")
            }
        },
        (BlobKind::RunOutput, _) => {
            let lines = bytes.split(|b| *b == b'\n').filter(|line| !line.is_empty());
            for line in lines {
                match serde_json::from_slice::<String>(line) {
                    Ok(line) => record.stdout.push(line),
                    Err(e) => {
                        tracing::warn!(job_id = %record.job_id, error = %e, "corrupt run output line");
                    }
                }
            }
        }
        (BlobKind::ErrorInfo, state) => {
            if let Some(info) = state.error_info_mut() {
                *info = text(bytes);
            }
        }
        (BlobKind::Html, JobState::Done(run)) => run.raw_html = text(bytes),
        (BlobKind::EmailHtml, JobState::Done(run)) => run.email_html = text(bytes),
        (BlobKind::RawDocument, JobState::Done(run)) => run.raw_document = text(bytes),
        (BlobKind::CssInlining, JobState::Done(run)) => run.css_inlining = text(bytes),
        (BlobKind::Pdf, JobState::Done(run)) => run.pdf = bytes,
        (kind, state) => {
            tracing::warn!(
                job_id = %record.job_id,
                blob = %kind,
                status = %state.status(),
                "blob does not belong to this status, ignoring"
            );
        }
    }
}

impl<C: Clock> JobStore for FsJobStore<C> {
    fn create_stub(&self, job: NewJob) -> Result<JobRecord, StoreError> {
        let mut table = self.table.lock();
        if let Some(existing) = table.jobs.get(&job.job_id) {
            let status = existing.record.status();
            if status != JobStatus::Deleted {
                return Err(StoreError::AlreadyExists { job_id: job.job_id, status });
            }
        }
        let start_ms = job.job_start_time_ms.unwrap_or_else(|| self.clock.epoch_ms());
        let mut record = JobRecord::stub(job.job_id, job.report_name, job.status, start_ms);
        if let Some(title) = job.report_title.filter(|t| !t.is_empty()) {
            record.report_title = title;
        }
        record.overrides = job.overrides;
        record.delivery = job.delivery;
        record.scheduler_job_id = job.scheduler_job_id;
        record.update_time_ms = self.next_update_ms(&mut table);

        let stale = table.jobs.get(&record.job_id).map(|old| old.blobs.clone()).unwrap_or_default();
        self.commit(&mut table, StoredJob { record: record.clone(), blobs: Vec::new() })?;
        self.remove_blobs(&record.job_id, &stale);

        tracing::info!(
            job_id = %record.job_id,
            report = %record.report_name,
            status = %record.status(),
            "saved job stub"
        );
        Ok(record)
    }

    fn update_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        update: StatusUpdate,
    ) -> Result<Option<JobRecord>, StoreError> {
        if status == JobStatus::Done {
            return Err(StoreError::DoneRequiresSaveResult { job_id: job_id.clone() });
        }

        let mut table = self.table.lock();
        let Some(stored) = table.jobs.get(job_id).cloned() else {
            tracing::warn!(job_id = %job_id, status = %status, "status update for unknown job");
            return Ok(None);
        };
        let from = stored.record.status();
        if !from.can_transition_to(status) {
            return Err(StoreError::IllegalTransition { job_id: job_id.clone(), from, to: status });
        }

        if status == JobStatus::Deleted {
            self.delete_locked(&mut table, job_id, false)?;
            return Ok(table.jobs.get(job_id).map(|stored| self.hydrate(stored, true)));
        }

        let state = JobState::without_payload(status, update.error_info)
            .ok_or_else(|| StoreError::DoneRequiresSaveResult { job_id: job_id.clone() })?;

        let mut entry = stored.clone();
        entry.record.state = state;
        if let Some(name) = update.report_name {
            entry.record.report_name = name;
        }
        if let Some(start) = update.job_start_time_ms {
            entry.record.job_start_time_ms = start;
        }

        // Error text now lives inline; a fresh run drops every earlier payload.
        let stale: Vec<BlobKind> = if status.is_active() && from.is_terminal() {
            entry.record.stdout.clear();
            std::mem::take(&mut entry.blobs)
        } else {
            let (stale, kept) = std::mem::take(&mut entry.blobs)
                .into_iter()
                .partition(|kind| *kind == BlobKind::ErrorInfo);
            entry.blobs = kept;
            stale
        };

        entry.record.update_time_ms = self.next_update_ms(&mut table);
        self.commit(&mut table, entry.clone())?;
        self.remove_blobs(job_id, &stale);
        drop(table);

        tracing::info!(job_id = %job_id, from = %from, to = %status, "updated job status");
        Ok(Some(self.hydrate(&entry, true)))
    }

    fn save_result(&self, record: &JobRecord) -> Result<JobRecord, StoreError> {
        let status = record.status();
        if !status.is_outcome() {
            return Err(StoreError::NotFinished { job_id: record.job_id.clone(), status });
        }

        let mut table = self.table.lock();
        let existing = table.jobs.get(&record.job_id).cloned();
        if let Some(existing) = &existing {
            let from = existing.record.status();
            if !from.can_transition_to(status) {
                return Err(StoreError::IllegalTransition {
                    job_id: record.job_id.clone(),
                    from,
                    to: status,
                });
            }
        }

        let mut saved = record.clone();
        saved.update_time_ms = self.next_update_ms(&mut table);
        let entry = self.offload(saved.clone())?;
        let stale: Vec<BlobKind> = existing
            .map(|old| old.blobs.into_iter().filter(|kind| !entry.blobs.contains(kind)).collect())
            .unwrap_or_default();
        self.commit(&mut table, entry)?;
        self.remove_blobs(&saved.job_id, &stale);

        tracing::info!(
            job_id = %saved.job_id,
            report = %saved.report_name,
            status = %status,
            "saved job result"
        );
        Ok(saved)
    }

    fn append_stdout(&self, job_id: &JobId, lines: &[String]) -> Result<(), StoreError> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut chunk = Vec::new();
        for line in lines {
            serde_json::to_writer(&mut chunk, line)?;
            chunk.push(b'\n');
        }

        let mut table = self.table.lock();
        let Some(stored) = table.jobs.get(job_id) else {
            tracing::warn!(job_id = %job_id, "stdout for unknown job");
            return Ok(());
        };
        if !stored.record.status().is_active() {
            tracing::warn!(
                job_id = %job_id,
                status = %stored.record.status(),
                "ignoring stdout for a job that is no longer running"
            );
            return Ok(());
        }
        let unreferenced = (!stored.blobs.contains(&BlobKind::RunOutput)).then(|| stored.clone());
        self.blobs.append(&BlobKind::RunOutput.blob_name(job_id), &chunk)?;

        let now = self.next_update_ms(&mut table);
        if let Some(mut entry) = unreferenced {
            entry.blobs.push(BlobKind::RunOutput);
            entry.record.update_time_ms = now;
            return self.commit(&mut table, entry);
        }
        if let Some(stored) = table.jobs.get_mut(job_id) {
            stored.record.update_time_ms = now;
        }
        Ok(())
    }

    fn get(&self, job_id: &JobId, load_payload: bool) -> Result<Option<JobRecord>, StoreError> {
        let stored = self.table.lock().jobs.get(job_id).cloned();
        Ok(stored.map(|stored| self.hydrate(&stored, load_payload)))
    }

    fn query(&self, query: &JobQuery) -> Result<Vec<JobRecord>, StoreError> {
        let mut hits: Vec<StoredJob> = {
            let table = self.table.lock();
            table.jobs.values().filter(|s| query.matches(&s.record)).cloned().collect()
        };
        hits.sort_by(|a, b| {
            b.record
                .update_time_ms
                .cmp(&a.record.update_time_ms)
                .then_with(|| a.record.job_id.cmp(&b.record.job_id))
        });
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        Ok(hits.iter().map(|stored| self.hydrate(stored, query.load_payload)).collect())
    }

    fn delete(&self, job_id: &JobId, dry_run: bool) -> Result<Option<DeletedJob>, StoreError> {
        let mut table = self.table.lock();
        self.delete_locked(&mut table, job_id, dry_run)
    }
}

#[cfg(test)]
#[path = "fs_store_tests.rs"]
mod tests;
