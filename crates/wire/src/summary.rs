// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rj_core::{JobId, JobRecord, JobStatus, Overrides};
use serde::{Deserialize, Serialize};

/// One line of a job listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub report_name: String,
    pub report_title: String,
    pub status: JobStatus,
    pub overrides: Overrides,
    pub job_start_time_ms: u64,
    pub update_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_finish_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_job_id: Option<String>,
}

impl From<&JobRecord> for JobSummary {
    fn from(record: &JobRecord) -> Self {
        JobSummary {
            job_id: record.job_id.clone(),
            report_name: record.report_name.clone(),
            report_title: record.report_title.clone(),
            status: record.status(),
            overrides: record.overrides.clone(),
            job_start_time_ms: record.job_start_time_ms,
            update_time_ms: record.update_time_ms,
            job_finish_time_ms: record.job_finish_time_ms(),
            scheduler_job_id: record.scheduler_job_id.clone(),
        }
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
