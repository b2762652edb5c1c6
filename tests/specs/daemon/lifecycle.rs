// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs
//!
//! Startup, shutdown and what survives a restart.

use crate::prelude::*;

#[tokio::test]
async fn results_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = daemon_config(&dir, "printf '<p>ok</p>'");
    let daemon = startup(config.clone()).unwrap();
    daemon.coordinator.submit(SubmitRequest::new("rpt").job_id("j1")).await.unwrap();
    daemon.shutdown(None).await.unwrap();

    let reader = attach(config).unwrap();

    let record = reader.read.get_job(&JobId::new("j1"), "rpt", true);
    assert_eq!(record.status(), JobStatus::Done);
    assert_eq!(record.rendered_html(), "<p>ok</p>");
}

#[tokio::test]
async fn shutdown_cancels_in_flight_jobs_for_readers() {
    let dir = tempfile::tempdir().unwrap();
    let config = daemon_config(&dir, "true");
    let daemon = startup(config.clone()).unwrap();
    daemon.ctx.store.create_stub(NewJob::new(JobId::new("j1"), "rpt")).unwrap();
    daemon
        .ctx
        .store
        .create_stub(NewJob::new(JobId::new("j2"), "rpt").status(JobStatus::Pending))
        .unwrap();
    let hunter = daemon.start_hunter();

    assert_eq!(daemon.shutdown(Some(hunter)).await.unwrap(), 2);

    let reader = attach(config).unwrap();
    for id in ["j1", "j2"] {
        let response = reader.read.status("rpt", &JobId::new(id));
        assert_eq!(response.status(), "CANCELLED");
    }
}

#[test]
fn one_writer_per_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = daemon_config(&dir, "true");
    let _writer = startup(config.clone()).unwrap();

    assert!(startup(config.clone()).is_err());
    assert!(attach(config).is_ok());
}
