// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status and the legal transition graph.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a job.
///
/// Tag-only view of [`crate::JobState`]; used for filters, cache comparisons
/// and wire payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    Pending,
    Done,
    Error,
    Cancelled,
    Timeout,
    Deleted,
}

crate::simple_display! {
    JobStatus {
        Submitted => "submitted",
        Pending => "pending",
        Done => "done",
        Error => "error",
        Cancelled => "cancelled",
        Timeout => "timeout",
        Deleted => "deleted",
    }
}

#[derive(Debug, Error)]
#[error("unknown job status: {0}")]
pub struct ParseStatusError(String);

impl std::str::FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s) || status.label() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Submitted,
        JobStatus::Pending,
        JobStatus::Done,
        JobStatus::Error,
        JobStatus::Cancelled,
        JobStatus::Timeout,
        JobStatus::Deleted,
    ];

    /// Statuses the hunter watches for deadlines.
    pub const ACTIVE: [JobStatus; 2] = [JobStatus::Submitted, JobStatus::Pending];

    /// Human-facing label shown to users polling a job.
    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Submitted => "Submitted to run",
            JobStatus::Pending => "Running...",
            JobStatus::Done => "Checks done!",
            JobStatus::Error => "Error",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Timeout => "Report timed out. Please try again!",
            JobStatus::Deleted => "This report has been deleted.",
        }
    }

    /// Submitted or pending: the job may still change on its own.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Submitted | JobStatus::Pending)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Terminal states a job can finish a run in (everything but `Deleted`).
    pub fn is_outcome(self) -> bool {
        matches!(
            self,
            JobStatus::Done | JobStatus::Error | JobStatus::Cancelled | JobStatus::Timeout
        )
    }

    /// Whether a record in `self` may be overwritten with `next`.
    ///
    /// Edges: `{Submitted, Pending} -> any outcome -> Deleted`, plus
    /// `Submitted -> Pending`, and `Error -> Pending` for a retry of the same
    /// job id. Rewriting the current status is always allowed. A job still
    /// running cannot be deleted.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self == next {
            return true;
        }
        match (self, next) {
            (from, JobStatus::Deleted) => from.is_outcome(),
            (JobStatus::Deleted, _) => false,
            (JobStatus::Submitted, _) => true,
            (JobStatus::Pending, next) => next.is_outcome(),
            (JobStatus::Error, JobStatus::Pending) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
