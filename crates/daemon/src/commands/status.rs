// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rjd status`

use anyhow::Result;
use clap::Args;
use rj_core::JobId;
use rj_wire::StatusResponse;

use crate::lifecycle::{attach, Config};
use crate::output::{print_jobs, print_json, OutputFormat};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only jobs of this report
    pub report_name: Option<String>,

    /// Show one job (requires the report name)
    pub job_id: Option<String>,

    /// Maximum jobs to list (defaults to RJ_RESULT_LIMIT)
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn status(config: Config, args: StatusArgs, format: OutputFormat) -> Result<()> {
    let limit = args.limit.unwrap_or(config.result_limit);
    let daemon = attach(config)?;
    match (args.report_name, args.job_id) {
        (Some(report), Some(job_id)) => {
            let response = daemon.read.status(&report, &JobId::new(job_id));
            print_status(&response, format)
        }
        (report, _) => print_jobs(&daemon.read.recent(report.as_deref(), limit), format),
    }
}

pub fn format_status(response: &StatusResponse) -> String {
    match response {
        StatusResponse::Finished { status, results_url } => format!("{status}\n{results_url}"),
        StatusResponse::Running { status, run_output } if run_output.is_empty() => status.clone(),
        StatusResponse::Running { status, run_output } => format!("{status}\n\n{run_output}"),
        StatusResponse::Missing { status } => status.clone(),
    }
}

fn print_status(response: &StatusResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", format_status(response));
            Ok(())
        }
        OutputFormat::Json => print_json(response),
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
