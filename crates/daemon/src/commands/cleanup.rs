// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rjd cleanup`

use anyhow::Result;
use clap::Args;
use rj_engine::{delete_old_reports, CleanupReport};

use crate::lifecycle::{startup, Config};
use crate::output::{print_json, OutputFormat};

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Delete jobs started more than this many days ago
    #[arg(long)]
    pub days: u32,

    /// Only jobs of this report
    #[arg(long)]
    pub report_name: Option<String>,

    /// List what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,
}

pub fn cleanup(config: Config, args: CleanupArgs, format: OutputFormat) -> Result<()> {
    crate::logging::init_stderr();
    let daemon = startup(config)?;
    let report = delete_old_reports(&daemon.ctx, args.days, args.report_name.as_deref(), args.dry_run)?;
    match format {
        OutputFormat::Text => println!("{}", format_cleanup(&report)),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

pub fn format_cleanup(report: &CleanupReport) -> String {
    let verb = if report.dry_run { "Would delete" } else { "Deleted" };
    let mut out = format!("{verb} {} job(s)", report.deleted.len());
    for job_id in &report.deleted {
        out.push_str(&format!("\n  {job_id}"));
    }
    if !report.failed.is_empty() {
        out.push_str(&format!("\n{} failure(s):", report.failed.len()));
        for (job_id, error) in &report.failed {
            out.push_str(&format!("\n  {job_id}: {error}"));
        }
    }
    out
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
