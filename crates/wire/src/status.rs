// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rj_core::{JobId, JobRecord};
use serde::{Deserialize, Serialize};

/// Status shown when no job matches a latest-by-overrides lookup
pub const NOT_FOUND_FOR_OVERRIDES: &str = "Job not found for given overrides";
/// Status shown when a polled job id is not in the store
pub const JOB_NOT_FOUND: &str = "Job not found. Did you use an old job ID?";

/// Answer to a status poll.
///
/// `status` is the human-facing label of the job's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusResponse {
    /// The run finished; results live at `results_url`
    Finished { status: String, results_url: String },
    /// Still running; `run_output` is the accumulated stdout
    Running { status: String, run_output: String },
    /// Nothing to report on
    Missing { status: String },
}

impl StatusResponse {
    pub fn from_record(record: &JobRecord) -> Self {
        let status = record.status();
        if status.is_outcome() {
            StatusResponse::Finished {
                status: status.label().to_string(),
                results_url: results_url(&record.report_name, &record.job_id),
            }
        } else {
            StatusResponse::Running {
                status: status.label().to_string(),
                run_output: record.stdout.join("\n"),
            }
        }
    }

    pub fn missing(status: impl Into<String>) -> Self {
        StatusResponse::Missing { status: status.into() }
    }

    pub fn status(&self) -> &str {
        match self {
            StatusResponse::Finished { status, .. }
            | StatusResponse::Running { status, .. }
            | StatusResponse::Missing { status } => status,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, StatusResponse::Finished { .. })
    }
}

/// Where the rendered results of a job are served.
pub fn results_url(report_name: &str, job_id: &JobId) -> String {
    format!("/results/{}/{}", report_name, job_id)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
