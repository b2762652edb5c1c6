// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rjd run`

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use rj_core::{expand_overrides, Delivery, JobId, JobRecord, JobStatus, OverridesError};
use rj_engine::{CoordinatorError, SubmitRequest};
use rj_storage::JobStore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::lifecycle::{startup, Config, Daemon};
use crate::output::{print_jobs, OutputFormat};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Report to run
    pub report_name: String,

    /// Display title for the job
    #[arg(long)]
    pub title: Option<String>,

    /// Parameter overrides: a JSON object, or a list of objects (one job each)
    #[arg(long = "overrides-as-json", default_value = "{}")]
    pub overrides_as_json: String,

    /// Run one job per element of this override's list value
    #[arg(long = "iterate-override-values-of")]
    pub iterate_override_values_of: Option<String>,

    /// Extra attempts after a failure
    #[arg(long, default_value_t = 0)]
    pub n_retries: u32,

    /// Comma-separated mail recipients
    #[arg(long, default_value = "")]
    pub mailto: String,

    #[arg(long)]
    pub mailfrom: Option<String>,

    /// Skip PDF rendering of the result
    #[arg(long)]
    pub no_pdf: bool,

    /// Hide report code in rendered output
    #[arg(long)]
    pub hide_code: bool,
}

/// One submission per expanded override set.
pub fn build_requests(args: &RunArgs) -> Result<Vec<SubmitRequest>, OverridesError> {
    let delivery = Delivery {
        mailto: args.mailto.clone(),
        mailfrom: args.mailfrom.clone(),
        generate_pdf_output: !args.no_pdf,
        hide_code: args.hide_code,
    };
    let sets = expand_overrides(&args.overrides_as_json, args.iterate_override_values_of.as_deref())?;
    Ok(sets
        .into_iter()
        .map(|overrides| {
            let mut request = SubmitRequest::new(&args.report_name)
                .overrides(overrides)
                .delivery(delivery.clone())
                .n_retries(args.n_retries);
            request.report_title = args.title.clone();
            request
        })
        .collect())
}

pub async fn run(config: Config, args: RunArgs, format: OutputFormat) -> Result<()> {
    crate::logging::init_stderr();
    let requests = build_requests(&args)?;
    let daemon = startup(config)?;

    let interrupt = daemon.shutdown.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling remaining work");
            interrupt.cancel();
        }
    });
    let outcome = run_requests(daemon, requests).await;
    watcher.abort();
    let outcome = outcome?;

    print_jobs(&outcome.records, format)?;
    if outcome.failed > 0 {
        anyhow::bail!("{} of {} job(s) failed", outcome.failed, outcome.total);
    }
    Ok(())
}

/// Final records of a run, in request order.
#[derive(Debug)]
pub struct RunOutcome {
    pub records: Vec<JobRecord>,
    pub total: usize,
    /// Jobs that did not finish `DONE`
    pub failed: usize,
}

/// Run every request at once with the hunter enforcing deadlines, then shut
/// the daemon down.
///
/// The process holding the state lock is the only one running a hunter, so
/// `rjd run` starts its own for as long as its jobs run. Tripping the
/// shutdown signal abandons the jobs still running; shutdown then marks them
/// `CANCELLED`.
pub async fn run_requests(daemon: Daemon, requests: Vec<SubmitRequest>) -> Result<RunOutcome> {
    let hunter = daemon.start_hunter();
    let mut jobs = JoinSet::new();
    let mut job_ids = Vec::with_capacity(requests.len());
    for mut request in requests {
        let job_id = request.job_id.get_or_insert_with(JobId::generate).clone();
        job_ids.push(job_id);
        let coordinator = Arc::clone(&daemon.coordinator);
        jobs.spawn(async move { coordinator.submit(request).await });
    }
    info!(jobs = job_ids.len(), "running reports");

    let interrupted = daemon.shutdown.clone();
    loop {
        tokio::select! {
            joined = jobs.join_next() => match joined {
                None => break,
                Some(Ok(Ok(record))) => {
                    info!(job_id = %record.job_id, status = %record.status(), "job finished");
                }
                Some(Ok(Err(CoordinatorError::Execution { job_id, attempts, diagnostic }))) => {
                    warn!(job_id = %job_id, attempts, diagnostic = %diagnostic, "job failed");
                }
                Some(Ok(Err(e))) => warn!(error = %e, "job did not complete"),
                Some(Err(e)) => warn!(error = %e, "job task did not finish"),
            },
            _ = interrupted.cancelled() => {
                warn!(remaining = jobs.len(), "interrupted, abandoning running jobs");
                jobs.shutdown().await;
                break;
            }
        }
    }

    let store = Arc::clone(&daemon.ctx.store);
    daemon.shutdown(Some(hunter)).await?;

    let mut records = Vec::with_capacity(job_ids.len());
    for job_id in &job_ids {
        match store.get(job_id, false)? {
            Some(record) => records.push(record),
            None => warn!(job_id = %job_id, "job never reached the store"),
        }
    }
    let total = job_ids.len();
    let failed = total - records.iter().filter(|r| r.status() == JobStatus::Done).count();
    info!(total, failed, "run finished");
    Ok(RunOutcome { records, total, failed })
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
