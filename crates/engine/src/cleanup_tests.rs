// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::TestEnv;
use rj_core::test_support::completed;
use rj_core::{FakeClock, JobStatus};
use std::time::Duration;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// `old` and `other` are ten days old, `new` one day old.
fn seeded() -> TestEnv {
    let env = TestEnv::new();
    let start = FakeClock::START_MS;
    env.store().save_result(&completed("old", "rpt", start, start + 1)).unwrap();
    env.store().save_result(&completed("other", "other", start, start + 1)).unwrap();
    env.store()
        .save_result(&completed("new", "rpt", start + 9 * DAY.as_millis() as u64, start + 1))
        .unwrap();
    env.clock.advance(DAY * 10);
    env
}

fn status_of(env: &TestEnv, id: &str) -> JobStatus {
    env.store().get(&JobId::new(id), false).unwrap().unwrap().status()
}

#[test]
fn deletes_jobs_older_than_cutoff() {
    let env = seeded();

    let report = delete_old_reports(&env.ctx, 5, None, false).unwrap();

    let mut deleted = report.deleted.clone();
    deleted.sort();
    assert_eq!(deleted, vec![JobId::new("old"), JobId::new("other")]);
    assert!(report.failed.is_empty());
    assert_eq!(status_of(&env, "old"), JobStatus::Deleted);
    assert_eq!(status_of(&env, "new"), JobStatus::Done);
}

#[test]
fn narrows_to_one_report() {
    let env = seeded();

    let report = delete_old_reports(&env.ctx, 5, Some("rpt"), false).unwrap();

    assert_eq!(report.deleted, vec![JobId::new("old")]);
    assert_eq!(status_of(&env, "other"), JobStatus::Done);
}

#[test]
fn dry_run_changes_nothing() {
    let env = seeded();

    let report = delete_old_reports(&env.ctx, 5, None, true).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.deleted.len(), 2);
    assert_eq!(status_of(&env, "old"), JobStatus::Done);
    assert_eq!(status_of(&env, "other"), JobStatus::Done);
}

#[test]
fn drops_cached_snapshots_of_deleted_jobs() {
    let env = seeded();
    let old = env.store().get(&JobId::new("old"), true).unwrap().unwrap();
    env.cache().set_job(&old, None).unwrap();

    delete_old_reports(&env.ctx, 5, None, false).unwrap();

    assert!(env.cache().get_job("rpt", &JobId::new("old")).unwrap().is_none());
}

#[test]
fn second_sweep_finds_nothing() {
    let env = seeded();
    delete_old_reports(&env.ctx, 5, None, false).unwrap();

    let report = delete_old_reports(&env.ctx, 5, None, false).unwrap();
    assert!(report.deleted.is_empty());
}

#[test]
fn jobs_still_running_are_not_candidates() {
    let env = seeded();
    env.store()
        .create_stub(
            rj_storage::NewJob::new(JobId::new("stuck"), "rpt")
                .job_start_time_ms(FakeClock::START_MS),
        )
        .unwrap();

    let report = delete_old_reports(&env.ctx, 5, None, false).unwrap();

    assert!(!report.deleted.contains(&JobId::new("stuck")));
    assert!(report.failed.is_empty());
    assert_eq!(status_of(&env, "stuck"), JobStatus::Pending);
}
