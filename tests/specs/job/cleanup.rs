// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cleanup specs
//!
//! Old jobs are deleted from the store and dropped from the cache.

use crate::prelude::*;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test]
async fn old_results_are_deleted_and_uncached() {
    let scenario = Scenario::new();
    scenario.worker.push("rpt", Ok(ExecutionOutput::html("<p>ok</p>")));
    scenario.coordinator().submit(SubmitRequest::new("rpt").job_id("old")).await.unwrap();
    assert!(scenario.ctx.cache.get_job("rpt", &JobId::new("old")).unwrap().is_some());
    scenario.clock.advance(DAY * 10);
    scenario.stub("new", "rpt", JobStatus::Submitted);

    let report = delete_old_reports(&scenario.ctx, 7, None, false).unwrap();

    assert_eq!(report.deleted, vec![JobId::new("old")]);
    assert!(scenario.ctx.cache.get_job("rpt", &JobId::new("old")).unwrap().is_none());
    let response = scenario.read().status("rpt", &JobId::new("old"));
    assert_eq!(response.status(), "This report has been deleted.");
    assert_eq!(scenario.stored("new").status(), JobStatus::Submitted);
}

#[tokio::test]
async fn dry_run_leaves_everything_in_place() {
    let scenario = Scenario::new();
    scenario.worker.push("rpt", Ok(ExecutionOutput::html("<p>ok</p>")));
    scenario.coordinator().submit(SubmitRequest::new("rpt").job_id("old")).await.unwrap();
    scenario.clock.advance(DAY * 10);

    let report = delete_old_reports(&scenario.ctx, 7, None, true).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.deleted, vec![JobId::new("old")]);
    assert_eq!(scenario.stored("old").status(), JobStatus::Done);
}

#[test]
fn jobs_still_running_survive_cleanup() {
    let scenario = Scenario::new();
    scenario.stub("queued", "rpt", JobStatus::Submitted);
    scenario.stub("running", "rpt", JobStatus::Pending);
    scenario.clock.advance(DAY * 10);

    let report = delete_old_reports(&scenario.ctx, 7, None, false).unwrap();

    assert!(report.deleted.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(scenario.stored("queued").status(), JobStatus::Submitted);
    assert_eq!(scenario.stored("running").status(), JobStatus::Pending);
}

#[tokio::test]
async fn deleted_jobs_reach_the_cache_through_the_hunter() {
    let scenario = Scenario::new();
    scenario.worker.push("rpt", Ok(ExecutionOutput::html("<p>ok</p>")));
    scenario.coordinator().submit(SubmitRequest::new("rpt").job_id("j1")).await.unwrap();
    let hunter = scenario.hunter();
    hunter.run_once().unwrap();
    scenario.ctx.store.delete(&JobId::new("j1"), false).unwrap();
    scenario.clock.advance(Duration::from_secs(10));

    hunter.run_once().unwrap();

    let cached = scenario.ctx.cache.get_job("rpt", &JobId::new("j1")).unwrap().unwrap();
    assert_eq!(cached.status(), JobStatus::Deleted);
}
