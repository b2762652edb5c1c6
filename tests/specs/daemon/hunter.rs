// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hunter specs
//!
//! Stale jobs are timed out and the cache follows the store.

use crate::prelude::*;

#[test]
fn stuck_submission_times_out_and_polls_see_it() {
    let scenario = Scenario::new();
    scenario.stub("j1", "rpt", JobStatus::Submitted);
    scenario.clock.advance(Duration::from_secs(3 * 60));

    let report = scenario.hunter().run_once().unwrap();

    assert_eq!(report.timed_out, vec![JobId::new("j1")]);
    let response = scenario.read().status("rpt", &JobId::new("j1"));
    assert_eq!(response.status(), "Report timed out. Please try again!");
    assert!(response.is_finished());
    let cached = scenario.ctx.cache.get_job("rpt", &JobId::new("j1")).unwrap().unwrap();
    assert_eq!(cached.status(), JobStatus::Timeout);
}

#[test]
fn running_job_inside_its_window_is_left_alone() {
    let scenario = Scenario::new();
    scenario.stub("j1", "rpt", JobStatus::Pending);
    scenario.clock.advance(Duration::from_secs(59 * 60));

    let report = scenario.hunter().run_once().unwrap();

    assert!(report.timed_out.is_empty());
    assert_eq!(scenario.stored("j1").status(), JobStatus::Pending);
}

#[test]
fn repeated_passes_count_each_outcome_once() {
    let scenario = Scenario::new();
    scenario.stub("j1", "rpt", JobStatus::Submitted);
    scenario.clock.advance(Duration::from_secs(200));
    let hunter = scenario.hunter();

    hunter.run_once().unwrap();
    scenario.clock.advance(Duration::from_secs(10));
    let second = hunter.run_once().unwrap();
    scenario.clock.advance(Duration::from_secs(10));
    hunter.run_once().unwrap();

    assert!(second.timed_out.is_empty());
    let counts = hunter.counters().snapshot();
    assert_eq!(counts.timeouts, 1);
    assert_eq!(counts.successes, 0);
    assert_eq!(counts.failures, 0);
}

#[tokio::test]
async fn finished_runs_are_counted_by_outcome() {
    let scenario = Scenario::new();
    scenario.worker.push("ok", Ok(ExecutionOutput::html("<p>ok</p>")));
    scenario.worker.always_fail("bad", "boom");
    let coordinator = scenario.coordinator();
    coordinator.submit(SubmitRequest::new("ok").job_id("j1")).await.unwrap();
    coordinator.submit(SubmitRequest::new("bad").job_id("j2")).await.unwrap_err();
    let hunter = scenario.hunter();

    let report = hunter.run_once().unwrap();

    assert_eq!(report.successes, 1);
    assert_eq!(report.failures, 1);
    let counts = hunter.counters().snapshot();
    assert_eq!((counts.successes, counts.failures), (1, 1));
}
