// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use rj_core::JobRecord;
use rj_wire::JobSummary;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One aligned line per job: id, status, report, start time.
pub fn format_job_line(record: &JobRecord) -> String {
    format!(
        "{:<36}  {:<9}  {:<24}  {}",
        record.job_id,
        record.status().as_str(),
        record.report_name,
        format_epoch_ms(record.job_start_time_ms)
    )
}

/// Print a job listing in text or JSON.
pub fn print_jobs(records: &[JobRecord], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No jobs");
            }
            for record in records {
                println!("{}", format_job_line(record));
            }
            Ok(())
        }
        OutputFormat::Json => {
            let summaries: Vec<JobSummary> = records.iter().map(JobSummary::from).collect();
            print_json(&summaries)
        }
    }
}

/// UTC timestamp like `2018-01-12 00:00:00`, or `-` for zero.
pub fn format_epoch_ms(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    chrono::DateTime::from_timestamp_millis(epoch_ms as i64)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
