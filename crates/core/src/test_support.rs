// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{CompletedRun, JobId, JobRecord, JobStatus};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for job statuses.
pub mod strategies {
    use crate::JobStatus;
    use proptest::prelude::*;

    pub fn arb_status() -> impl Strategy<Value = JobStatus> {
        proptest::sample::select(JobStatus::ALL.to_vec())
    }
}

// ── Record factories ────────────────────────────────────────────────────

/// A pending record for `report_name` started at `start_ms`.
pub fn pending(job_id: &str, report_name: &str, start_ms: u64) -> JobRecord {
    JobRecord::stub(JobId::new(job_id), report_name, JobStatus::Pending, start_ms)
}

/// A complete record with every offloadable field populated.
pub fn completed(job_id: &str, report_name: &str, start_ms: u64, finish_ms: u64) -> JobRecord {
    JobRecord::builder()
        .job_id(job_id)
        .report_name(report_name)
        .report_title(report_name)
        .job_start_time_ms(start_ms)
        .stdout(&["cell 1", "cell 2"])
        .done(CompletedRun {
            job_finish_time_ms: finish_ms,
            raw_html: "<p>ok</p>".to_string(),
            email_html: "<p>ok (mail)</p>".to_string(),
            raw_document: r#"{"cells": []}"#.to_string(),
            pdf: vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff],
            email_subject: "Report done".to_string(),
            css_inlining: "p { color: red; }".to_string(),
        })
        .build()
}

/// An error record carrying `error_info`.
pub fn errored(job_id: &str, report_name: &str, start_ms: u64, error_info: &str) -> JobRecord {
    JobRecord::builder()
        .job_id(job_id)
        .report_name(report_name)
        .report_title(report_name)
        .job_start_time_ms(start_ms)
        .error(error_info)
        .build()
}
