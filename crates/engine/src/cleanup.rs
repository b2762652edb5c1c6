// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Age-based deletion of old jobs.

use rj_core::{Clock, JobId};
use rj_storage::{CacheBackend, JobStore};
use serde::Serialize;

use crate::context::JobContext;
use crate::error::CleanupError;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: Vec<JobId>,
    /// Jobs whose deletion failed, with the error
    pub failed: Vec<(JobId, String)>,
    pub dry_run: bool,
}

/// Delete every job started more than `days` ago, optionally only for one
/// report.
///
/// Failures on individual jobs are logged and collected; the sweep carries
/// on. With `dry_run` the jobs that would go are reported and nothing
/// changes.
pub fn delete_old_reports<S: JobStore, B: CacheBackend, C: Clock>(
    ctx: &JobContext<S, B, C>,
    days: u32,
    report_name: Option<&str>,
    dry_run: bool,
) -> Result<CleanupReport, CleanupError> {
    let cutoff_ms = ctx.clock.epoch_ms().saturating_sub(u64::from(days) * DAY_MS);
    let candidates = ctx.store.job_ids_older_than(cutoff_ms, report_name)?;
    tracing::info!(
        days,
        report = report_name.unwrap_or("*"),
        candidates = candidates.len(),
        dry_run,
        "deleting old reports"
    );

    let mut report = CleanupReport { dry_run, ..Default::default() };
    for job_id in candidates {
        match ctx.store.delete(&job_id, dry_run) {
            Ok(Some(deleted)) => {
                if !dry_run {
                    if let Err(e) = ctx.cache.invalidate(&deleted.record.report_name, &job_id) {
                        tracing::warn!(job_id = %job_id, error = %e, "failed to drop cached job");
                    }
                }
                tracing::debug!(job_id = %job_id, blobs = deleted.blob_names.len(), "deleted job");
                report.deleted.push(job_id);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "failed to delete job");
                report.failed.push((job_id, e.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
