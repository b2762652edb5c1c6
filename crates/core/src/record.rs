// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job records and their per-status payloads.

use crate::id::JobId;
use crate::overrides::{self, Overrides};
use crate::status::JobStatus;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Error text recorded on jobs cancelled by process shutdown.
pub const CANCEL_MESSAGE: &str =
    "The webapp shut down while this job was running. Please resubmit with the same parameters.";

/// Output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedRun {
    pub job_finish_time_ms: u64,
    /// Rendered HTML report
    #[serde(default)]
    pub raw_html: String,
    /// HTML variant suitable for mail bodies
    #[serde(default)]
    pub email_html: String,
    /// Raw executed notebook document
    #[serde(default)]
    pub raw_document: String,
    #[serde(default)]
    pub pdf: Vec<u8>,
    #[serde(default)]
    pub email_subject: String,
    /// CSS resources inlined into the rendered HTML
    #[serde(default)]
    pub css_inlining: String,
}

/// Status-specific state of a job. The variant is the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Submitted,
    Pending,
    Done(CompletedRun),
    Error { error_info: String },
    Cancelled { error_info: String },
    Timeout { error_info: String },
    Deleted,
}

impl JobState {
    /// Build a payload-free state for `status`.
    ///
    /// Returns `None` for `Done`, which can only be reached with a full
    /// [`CompletedRun`].
    pub fn without_payload(status: JobStatus, error_info: Option<String>) -> Option<Self> {
        let error_info = error_info.unwrap_or_default();
        Some(match status {
            JobStatus::Submitted => JobState::Submitted,
            JobStatus::Pending => JobState::Pending,
            JobStatus::Done => return None,
            JobStatus::Error => JobState::Error { error_info },
            JobStatus::Cancelled => JobState::Cancelled { error_info },
            JobStatus::Timeout => JobState::Timeout { error_info },
            JobStatus::Deleted => JobState::Deleted,
        })
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Submitted => JobStatus::Submitted,
            JobState::Pending => JobStatus::Pending,
            JobState::Done(_) => JobStatus::Done,
            JobState::Error { .. } => JobStatus::Error,
            JobState::Cancelled { .. } => JobStatus::Cancelled,
            JobState::Timeout { .. } => JobStatus::Timeout,
            JobState::Deleted => JobStatus::Deleted,
        }
    }

    pub fn error_info(&self) -> Option<&str> {
        match self {
            JobState::Error { error_info }
            | JobState::Cancelled { error_info }
            | JobState::Timeout { error_info } => Some(error_info),
            _ => None,
        }
    }

    pub fn error_info_mut(&mut self) -> Option<&mut String> {
        match self {
            JobState::Error { error_info }
            | JobState::Cancelled { error_info }
            | JobState::Timeout { error_info } => Some(error_info),
            _ => None,
        }
    }
}

/// Mail routing and rendering options chosen at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Comma-separated recipients; empty means no mail
    #[serde(default)]
    pub mailto: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailfrom: Option<String>,
    #[serde(default = "default_true")]
    pub generate_pdf_output: bool,
    #[serde(default)]
    pub hide_code: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Delivery {
    fn default() -> Self {
        Self { mailto: String::new(), mailfrom: None, generate_pdf_output: true, hide_code: false }
    }
}

impl Delivery {
    pub fn recipients(&self) -> Vec<String> {
        self.mailto
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One job: a single run of a report with specific overrides.
///
/// Exactly one record exists per `job_id`; every transition overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub report_name: String,
    pub report_title: String,
    #[serde(default)]
    pub overrides: Overrides,
    pub job_start_time_ms: u64,
    /// Strictly increasing across mutations; assigned by the job store.
    pub update_time_ms: u64,
    /// Accumulated run output
    #[serde(default)]
    pub stdout: Vec<String>,
    #[serde(default)]
    pub delivery: Delivery,
    /// Set when a trigger source submitted the job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_job_id: Option<String>,
    pub state: JobState,
}

impl JobRecord {
    /// A fresh submitted/pending record. The title defaults to the report name.
    pub fn stub(
        job_id: JobId,
        report_name: impl Into<String>,
        status: JobStatus,
        job_start_time_ms: u64,
    ) -> Self {
        let report_name = report_name.into();
        let state = match status {
            JobStatus::Submitted => JobState::Submitted,
            _ => JobState::Pending,
        };
        Self {
            job_id,
            report_title: report_name.clone(),
            report_name,
            overrides: Overrides::new(),
            job_start_time_ms,
            update_time_ms: job_start_time_ms,
            stdout: Vec::new(),
            delivery: Delivery::default(),
            scheduler_job_id: None,
            state,
        }
    }

    /// A transient error-shaped record for lookups that found nothing.
    ///
    /// Never persisted; lets readers always receive a uniform shape.
    pub fn not_found(
        job_id: JobId,
        report_name: impl Into<String>,
        overrides: Overrides,
        message: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        let mut record = Self::stub(job_id, report_name, JobStatus::Pending, now_ms);
        record.overrides = overrides;
        record.state = JobState::Error { error_info: message.into() };
        record
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn error_info(&self) -> Option<&str> {
        self.state.error_info()
    }

    pub fn completed(&self) -> Option<&CompletedRun> {
        match &self.state {
            JobState::Done(run) => Some(run),
            _ => None,
        }
    }

    pub fn job_finish_time_ms(&self) -> Option<u64> {
        self.completed().map(|run| run.job_finish_time_ms)
    }

    /// HTML shown for this job: the report for `Done`, an error panel for
    /// failed outcomes, nothing otherwise.
    pub fn rendered_html(&self) -> Cow<'_, str> {
        match (&self.state, self.error_info()) {
            (JobState::Done(run), _) => Cow::Borrowed(&run.raw_html),
            (_, Some(error_info)) => Cow::Owned(format!(
                "<p>This job resulted in an error: <br/><code style=\"white-space: pre-wrap;\">{}</code></p>",
                error_info
            )),
            _ => Cow::Borrowed(""),
        }
    }

    /// Mail body: the dedicated mail HTML when present, otherwise the report.
    pub fn email_html(&self) -> Cow<'_, str> {
        match self.completed() {
            Some(run) if !run.email_html.is_empty() => Cow::Borrowed(&run.email_html),
            _ => self.rendered_html(),
        }
    }

    /// True when this record's overrides contain every key/value of `filter`.
    pub fn matches_overrides(&self, filter: &Overrides) -> bool {
        overrides::matches(&self.overrides, filter)
    }
}

/// Test builder for [`JobRecord`] with sensible defaults.
#[cfg(any(test, feature = "test-support"))]
pub struct JobRecordBuilder {
    record: JobRecord,
}

#[cfg(any(test, feature = "test-support"))]
impl JobRecordBuilder {
    pub fn job_id(mut self, id: impl Into<JobId>) -> Self {
        self.record.job_id = id.into();
        self
    }

    pub fn report_name(mut self, name: impl Into<String>) -> Self {
        self.record.report_name = name.into();
        self
    }

    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.record.report_title = title.into();
        self
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.record.overrides = overrides;
        self
    }

    pub fn override_value(mut self, key: &str, value: serde_json::Value) -> Self {
        self.record.overrides.insert(key.to_string(), value);
        self
    }

    pub fn job_start_time_ms(mut self, ms: u64) -> Self {
        self.record.job_start_time_ms = ms;
        self
    }

    pub fn update_time_ms(mut self, ms: u64) -> Self {
        self.record.update_time_ms = ms;
        self
    }

    pub fn stdout(mut self, lines: &[&str]) -> Self {
        self.record.stdout = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn mailto(mut self, mailto: impl Into<String>) -> Self {
        self.record.delivery.mailto = mailto.into();
        self
    }

    pub fn state(mut self, state: JobState) -> Self {
        self.record.state = state;
        self
    }

    pub fn done(self, run: CompletedRun) -> Self {
        self.state(JobState::Done(run))
    }

    pub fn error(self, error_info: impl Into<String>) -> Self {
        self.state(JobState::Error { error_info: error_info.into() })
    }

    pub fn build(self) -> JobRecord {
        self.record
    }
}

#[cfg(any(test, feature = "test-support"))]
impl JobRecord {
    /// Create a builder with test defaults: a pending `sample/report` job.
    pub fn builder() -> JobRecordBuilder {
        JobRecordBuilder {
            record: JobRecord::stub(
                JobId::new("job-1"),
                "sample/report",
                JobStatus::Pending,
                crate::FakeClock::START_MS,
            ),
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
