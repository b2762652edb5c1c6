// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job execution specs
//!
//! Reports run through the daemon's shell worker.

use crate::prelude::*;

#[tokio::test]
async fn finished_report_points_at_its_results() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = startup(daemon_config(&dir, "printf '<p>ok</p>'")).unwrap();

    let done = daemon.coordinator.submit(SubmitRequest::new("rpt").job_id("rpt-1")).await.unwrap();

    assert_eq!(done.status(), JobStatus::Done);
    assert_eq!(
        daemon.read.status("rpt", &JobId::new("rpt-1")),
        StatusResponse::Finished {
            status: "Checks done!".to_string(),
            results_url: "/results/rpt/rpt-1".to_string(),
        }
    );
    let record = daemon.read.get_job(&JobId::new("rpt-1"), "rpt", false);
    assert_eq!(record.rendered_html(), "<p>ok</p>");
}

#[tokio::test]
async fn stderr_lines_become_run_output() {
    let dir = tempfile::tempdir().unwrap();
    let command = "echo loading >&2; echo rendering >&2; printf '<p>ok</p>'";
    let daemon = startup(daemon_config(&dir, command)).unwrap();

    let done = daemon.coordinator.submit(SubmitRequest::new("rpt").job_id("j1")).await.unwrap();

    assert_eq!(done.stdout, vec!["loading", "rendering"]);
}

#[tokio::test]
async fn report_name_reaches_the_command() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = startup(daemon_config(&dir, r#"printf '<h1>%s</h1>' "$RJ_REPORT_NAME""#)).unwrap();

    let done = daemon.coordinator.submit(SubmitRequest::new("sales").job_id("j1")).await.unwrap();

    assert_eq!(done.completed().unwrap().raw_html, "<h1>sales</h1>");
}

#[tokio::test]
async fn failing_report_is_retried_then_reported() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = startup(daemon_config(&dir, "echo boom >&2; exit 1")).unwrap();

    let err = daemon
        .coordinator
        .submit(SubmitRequest::new("rpt").job_id("rpt-2").n_retries(1))
        .await
        .unwrap_err();

    assert!(matches!(err, CoordinatorError::Execution { attempts: 2, .. }));
    let record = daemon.read.get_job(&JobId::new("rpt-2"), "rpt", true);
    assert_eq!(record.status(), JobStatus::Error);
    assert_eq!(record.error_info(), Some("boom"));
    assert_eq!(daemon.read.status("rpt", &JobId::new("rpt-2")).status(), "Error");
}

#[tokio::test]
async fn iterated_overrides_run_one_job_each() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = startup(daemon_config(&dir, "cat >/dev/null; printf ok")).unwrap();
    let sets = rj_core::expand_overrides(r#"{"region": ["eu", "us"]}"#, Some("region")).unwrap();

    for overrides in sets {
        daemon.coordinator.submit(SubmitRequest::new("rpt").overrides(overrides)).await.unwrap();
    }

    let latest = daemon.read.get_latest_successful_all_params("rpt");
    let mut regions: Vec<_> = latest.iter().map(|r| r.overrides["region"].clone()).collect();
    regions.sort_by_key(|v| v.to_string());
    assert_eq!(regions, vec![json!("eu"), json!("us")]);
}

#[tokio::test]
async fn successful_run_mails_recipients() {
    let scenario = Scenario::new();
    scenario.worker.push("rpt", Ok(ExecutionOutput::html("<p>ok</p>")));
    let delivery = rj_core::Delivery { mailto: "ops@x.io".to_string(), ..Default::default() };

    scenario
        .coordinator()
        .submit(SubmitRequest::new("rpt").job_id("j1").delivery(delivery))
        .await
        .unwrap();

    let sent = scenario.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["ops@x.io"]);
}

#[tokio::test(start_paused = true)]
async fn finish_time_reflects_how_long_the_report_ran() {
    let scenario = Scenario::new();
    scenario.worker.push("rpt", Ok(ExecutionOutput::html("<p>ok</p>")));
    scenario.worker.set_delay(Duration::from_secs(30));
    let mut overrides = Overrides::new();
    overrides.insert("n".to_string(), json!(5));
    let clock = scenario.clock.clone();
    let ten_seconds_in = async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        clock.advance(Duration::from_secs(10));
    };

    let coordinator = scenario.coordinator();
    let (done, ()) = tokio::join!(
        coordinator.submit(SubmitRequest::new("rpt").job_id("rpt/1").overrides(overrides)),
        ten_seconds_in,
    );

    assert_eq!(done.unwrap().status(), JobStatus::Done);
    let record = scenario.read().get_job(&JobId::new("rpt/1"), "rpt", false);
    assert_eq!(record.status(), JobStatus::Done);
    assert_eq!(record.job_finish_time_ms().unwrap() - record.job_start_time_ms, 10_000);
    assert_eq!(record.completed().unwrap().raw_html, "<p>ok</p>");
}
