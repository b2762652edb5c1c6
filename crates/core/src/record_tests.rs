// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn stub_defaults_title_to_report_name() {
    let record = JobRecord::stub(JobId::new("a"), "sales/daily", JobStatus::Submitted, 10);
    assert_eq!(record.report_title, "sales/daily");
    assert_eq!(record.status(), JobStatus::Submitted);
    assert_eq!(record.update_time_ms, 10);
    assert!(record.delivery.generate_pdf_output);
}

#[test]
fn stub_with_terminal_status_is_pending() {
    let record = JobRecord::stub(JobId::new("a"), "r", JobStatus::Done, 10);
    assert_eq!(record.status(), JobStatus::Pending);
}

#[test]
fn done_is_not_buildable_without_payload() {
    assert_eq!(JobState::without_payload(JobStatus::Done, None), None);
    assert_eq!(
        JobState::without_payload(JobStatus::Timeout, Some("late".into())),
        Some(JobState::Timeout { error_info: "late".into() })
    );
}

#[test]
fn error_html_wraps_error_info() {
    let record = JobRecord::builder().error("boom").build();
    let html = record.rendered_html();
    assert!(html.starts_with("<p>This job resulted in an error"));
    assert!(html.contains("<code style=\"white-space: pre-wrap;\">boom</code>"));
}

#[test]
fn email_html_falls_back_to_report() {
    let run = CompletedRun { raw_html: "<p>ok</p>".into(), ..Default::default() };
    let record = JobRecord::builder().done(run).build();
    assert_eq!(record.email_html(), "<p>ok</p>");
}

#[test]
fn recipients_split_and_trim() {
    let record = JobRecord::builder().mailto(" a@x.io, ,b@x.io ").build();
    assert_eq!(record.delivery.recipients(), vec!["a@x.io", "b@x.io"]);
}

#[test]
fn not_found_is_error_shaped() {
    let record = JobRecord::not_found(
        JobId::new("nope"),
        "r",
        Overrides::new(),
        "Job results not found",
        5,
    );
    assert_eq!(record.status(), JobStatus::Error);
    assert_eq!(record.error_info(), Some("Job results not found"));
}

#[test]
fn state_serializes_with_status_tag() {
    let record = JobRecord::builder()
        .override_value("n", json!(5))
        .state(JobState::Timeout { error_info: "late".into() })
        .build();
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["state"]["status"], "TIMEOUT");
    assert_eq!(value["state"]["error_info"], "late");

    let back: JobRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, record);
}

#[test]
fn done_state_keeps_pdf_bytes() {
    let run = CompletedRun { pdf: vec![0, 159, 146, 150], ..Default::default() };
    let record = JobRecord::builder().done(run).build();
    let json = serde_json::to_string(&record).unwrap();
    let back: JobRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back.completed().unwrap().pdf, vec![0, 159, 146, 150]);
}
