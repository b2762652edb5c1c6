// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::TestEnv;
use crate::CounterSnapshot;
use rj_core::test_support::{completed, errored};
use rj_core::FakeClock;
use rj_storage::{CacheError, FsJobStore, NewJob, ReportCache};
use yare::parameterized;

fn stub(env: &TestEnv, id: &str, status: JobStatus) {
    env.store().create_stub(NewJob::new(JobId::new(id), "rpt").status(status)).unwrap();
}

fn status_of(env: &TestEnv, id: &str) -> JobStatus {
    env.store().get(&JobId::new(id), false).unwrap().unwrap().status()
}

#[parameterized(
    submitted_before_deadline = { JobStatus::Submitted, 179, false },
    submitted_at_deadline = { JobStatus::Submitted, 180, true },
    submitted_after_deadline = { JobStatus::Submitted, 181, true },
    running_before_deadline = { JobStatus::Pending, 3599, false },
    running_after_deadline = { JobStatus::Pending, 3601, true },
)]
fn times_out_by_status_deadline(status: JobStatus, elapsed_secs: u64, expired: bool) {
    let env = TestEnv::new();
    stub(&env, "j1", status);
    env.clock.advance(Duration::from_secs(elapsed_secs));

    let report = env.hunter(HunterConfig::default()).run_once().unwrap();

    assert_eq!(report.timed_out.len(), usize::from(expired));
    let expected = if expired { JobStatus::Timeout } else { status };
    assert_eq!(status_of(&env, "j1"), expected);
}

#[test]
fn submission_timeout_message() {
    let env = TestEnv::new();
    stub(&env, "j1", JobStatus::Submitted);
    env.clock.advance(Duration::from_secs(181));

    env.hunter(HunterConfig::default()).run_once().unwrap();

    let record = env.store().get(&JobId::new("j1"), true).unwrap().unwrap();
    assert_eq!(
        record.error_info(),
        Some(
            "This request timed out while being submitted to run. Please try again! \
             Timed out after 0 minutes 1 seconds."
        )
    );
}

#[test]
fn running_timeout_message() {
    let env = TestEnv::new();
    stub(&env, "j1", JobStatus::Pending);
    env.clock.advance(Duration::from_secs(61 * 60));

    env.hunter(HunterConfig::default()).run_once().unwrap();

    let record = env.store().get(&JobId::new("j1"), true).unwrap().unwrap();
    assert_eq!(
        record.error_info(),
        Some(
            "This report timed out while running. Please try again! \
             Timed out after 1 minutes 0 seconds."
        )
    );
}

#[test]
fn job_finishing_mid_pass_does_not_stop_the_pass() {
    let env = TestEnv::new();
    stub(&env, "a", JobStatus::Pending);
    stub(&env, "b", JobStatus::Pending);
    stub(&env, "c", JobStatus::Submitted);
    env.clock.advance(Duration::from_secs(2 * 60 * 60));
    env.store().finish_before_next_update(completed("a", "rpt", FakeClock::START_MS, 1));
    let hunter = env.hunter(HunterConfig::default());

    let report = hunter.run_once().unwrap();

    let mut timed_out = report.timed_out.clone();
    timed_out.sort();
    assert_eq!(timed_out, vec![JobId::new("b"), JobId::new("c")]);
    assert_eq!(status_of(&env, "a"), JobStatus::Done);
    assert_eq!(hunter.counters().snapshot().timeouts, 2);
    let cached = env.cache().get_job("rpt", &JobId::new("a")).unwrap().unwrap();
    assert_eq!(cached.status(), JobStatus::Done);
}

#[test]
fn timed_out_job_is_cached_and_counted() {
    let env = TestEnv::new();
    stub(&env, "j1", JobStatus::Submitted);
    env.clock.advance(Duration::from_secs(200));
    let hunter = env.hunter(HunterConfig::default());

    hunter.run_once().unwrap();

    let cached = env.cache().get_job("rpt", &JobId::new("j1")).unwrap().unwrap();
    assert_eq!(cached.status(), JobStatus::Timeout);
    assert_eq!(hunter.counters().snapshot().timeouts, 1);
}

#[test]
fn iterations_are_idempotent() {
    let env = TestEnv::new();
    env.store().save_result(&completed("a", "rpt", 1, 2)).unwrap();
    env.store().save_result(&errored("b", "rpt", 1, "boom")).unwrap();
    let hunter = env.hunter(HunterConfig::default());

    let first = hunter.run_once().unwrap();
    assert_eq!(first.cache_writes, 2);
    assert_eq!((first.successes, first.failures), (1, 1));

    let second = hunter.run_once().unwrap();
    assert_eq!(second.changed, 2);
    assert_eq!(second.cache_writes, 0);
    assert_eq!((second.successes, second.failures), (0, 0));

    assert_eq!(
        hunter.counters().snapshot(),
        CounterSnapshot { successes: 1, failures: 1, timeouts: 0 }
    );
}

#[test]
fn stale_cached_status_is_replaced_with_full_record() {
    let env = TestEnv::new();
    stub(&env, "j1", JobStatus::Pending);
    let pending = env.store().get(&JobId::new("j1"), true).unwrap().unwrap();
    env.cache().set_job(&pending, None).unwrap();
    env.store().save_result(&completed("j1", "rpt", 1, 2)).unwrap();

    let report = env.hunter(HunterConfig::default()).run_once().unwrap();

    assert_eq!(report.cache_writes, 1);
    let cached = env.cache().get_job("rpt", &JobId::new("j1")).unwrap().unwrap();
    assert_eq!(cached.status(), JobStatus::Done);
    assert_eq!(cached.completed().unwrap().raw_html, "<p>ok</p>");
}

#[test]
fn counters_do_not_repeat_after_cache_expiry() {
    let env = TestEnv::new();
    env.store().save_result(&completed("a", "rpt", 1, 2)).unwrap();
    let hunter = env.hunter(HunterConfig::default());
    hunter.run_once().unwrap();

    // Past the hunter's cache TTL, but still inside the lookback window
    env.clock.advance(Duration::from_secs(6));
    let report = hunter.run_once().unwrap();

    assert_eq!(report.cache_writes, 1);
    assert_eq!(report.successes, 0);
    assert_eq!(hunter.counters().snapshot().successes, 1);
}

#[test]
fn deleted_jobs_reach_the_cache() {
    let env = TestEnv::new();
    env.store().save_result(&completed("a", "rpt", 1, 2)).unwrap();
    let hunter = env.hunter(HunterConfig::default());
    hunter.run_once().unwrap();

    env.store().delete(&JobId::new("a"), false).unwrap();
    let report = hunter.run_once().unwrap();

    assert_eq!(report.cache_writes, 1);
    let cached = env.cache().get_job("rpt", &JobId::new("a")).unwrap().unwrap();
    assert_eq!(cached.status(), JobStatus::Deleted);
}

#[test]
fn changes_older_than_lookback_are_not_rescanned() {
    let env = TestEnv::new();
    env.store().save_result(&completed("a", "rpt", 1, 2)).unwrap();
    let hunter = env.hunter(HunterConfig::default());
    hunter.run_once().unwrap();

    env.clock.advance(Duration::from_secs(120));
    hunter.run_once().unwrap();
    let report = hunter.run_once().unwrap();
    assert_eq!(report.changed, 0);
}

#[test]
fn lookback_never_shorter_than_poll_interval() {
    let config = HunterConfig::default()
        .poll_interval(Duration::from_secs(90))
        .lookback(Duration::from_secs(5));
    assert_eq!(config.effective_lookback(), Duration::from_secs(91));
    assert_eq!(HunterConfig::default().effective_lookback(), Duration::from_secs(60));
}

#[test]
fn tick_purges_expired_cache_entries_once_per_interval() {
    let env = TestEnv::new();
    let config = HunterConfig::default().cache_purge_interval(Duration::from_secs(60));
    let hunter = env.hunter(config);
    let short = || env.cache().set_raw("short", b"x".to_vec(), Duration::from_secs(5)).unwrap();

    short();
    env.clock.advance(Duration::from_secs(10));
    hunter.tick().unwrap();
    assert!(env.cache().backend().is_empty());

    short();
    env.clock.advance(Duration::from_secs(10));
    hunter.tick().unwrap();
    assert_eq!(env.cache().backend().len(), 1);

    env.clock.advance(Duration::from_secs(50));
    hunter.tick().unwrap();
    assert!(env.cache().backend().is_empty());
}

/// Cache backend that is always down.
struct DownCache;

impl CacheBackend for DownCache {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Backend("down".to_string()))
    }

    fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("down".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Backend("down".to_string()))
    }
}

fn hunter_with_down_cache(
    dir: &tempfile::TempDir,
    strict: bool,
) -> Hunter<FsJobStore<FakeClock>, DownCache, FakeClock> {
    let clock = FakeClock::new();
    let store = FsJobStore::open(dir.path(), clock.clone()).unwrap();
    store.save_result(&completed("a", "rpt", 1, 2)).unwrap();
    let cache = ReportCache::new(DownCache, Duration::from_secs(5));
    let ctx = JobContext::new(Arc::new(store), Arc::new(cache), clock);
    Hunter::new(ctx, HunterConfig::default().strict(strict), ShutdownSignal::new())
}

#[test]
fn lenient_tick_records_error_in_health() {
    let dir = tempfile::tempdir().unwrap();
    let hunter = hunter_with_down_cache(&dir, false);

    hunter.tick().unwrap();

    let health = hunter.health();
    assert_eq!(health.iterations, 1);
    assert!(health.last_error.unwrap().contains("down"));
}

#[test]
fn strict_tick_propagates_error() {
    let dir = tempfile::tempdir().unwrap();
    let hunter = hunter_with_down_cache(&dir, true);
    assert!(matches!(hunter.tick(), Err(HunterError::Cache(_))));
    assert_eq!(hunter.health().iterations, 1);
}

#[tokio::test(start_paused = true)]
async fn loop_polls_until_stopped() {
    let env = TestEnv::new();
    let hunter = Arc::new(env.hunter(HunterConfig::default()));
    let handle = Arc::clone(&hunter).start();

    tokio::time::sleep(Duration::from_secs(25)).await;
    let iterations = hunter.health().iterations;
    assert!(iterations >= 3, "only {iterations} iterations");

    handle.stop().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(hunter.health().iterations, iterations);
}

#[tokio::test(start_paused = true)]
async fn shutdown_signal_stops_loop() {
    let env = TestEnv::new();
    let hunter = Arc::new(env.hunter(HunterConfig::default()));
    let handle = Arc::clone(&hunter).start();

    env.shutdown.cancel();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(handle.is_finished());
    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn strict_loop_exits_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let hunter = Arc::new(hunter_with_down_cache(&dir, true));
    let handle = Arc::clone(&hunter).start();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(handle.is_finished());
    assert!(hunter.health().last_error.is_some());
    handle.stop().await;
}
