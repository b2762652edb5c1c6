// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The execution worker contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use rj_core::{CompletedRun, JobId, Overrides};

/// Errors from executing a report
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The report itself failed; `diagnostic` is what the user sees.
    #[error("execution failed: {diagnostic}")]
    Failed { diagnostic: String },

    #[error("failed to start worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("worker IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable worker output: {0}")]
    Output(String),
}

impl ExecutionError {
    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self::Failed { diagnostic: diagnostic.into() }
    }

    /// Text recorded as the job's `error_info`.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Failed { diagnostic } => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}

/// What to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRequest {
    pub job_id: JobId,
    pub report_name: String,
    pub report_title: String,
    pub overrides: Overrides,
    pub generate_pdf: bool,
    pub hide_code: bool,
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOutput {
    pub raw_html: String,
    pub email_html: String,
    pub raw_document: String,
    pub pdf: Vec<u8>,
    pub email_subject: String,
    pub css_inlining: String,
    /// Run output lines
    pub stdout: Vec<String>,
}

impl ExecutionOutput {
    pub fn html(raw_html: impl Into<String>) -> Self {
        Self { raw_html: raw_html.into(), ..Self::default() }
    }

    /// Split into the completed run (finished at `finish_ms`) and the run output.
    pub fn into_run(self, finish_ms: u64) -> (CompletedRun, Vec<String>) {
        let run = CompletedRun {
            job_finish_time_ms: finish_ms,
            raw_html: self.raw_html,
            email_html: self.email_html,
            raw_document: self.raw_document,
            pdf: self.pdf,
            email_subject: self.email_subject,
            css_inlining: self.css_inlining,
        };
        (run, self.stdout)
    }
}

/// Where a worker reports output lines while it runs.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl ProgressSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that drops every line.
    pub fn discard() -> Self {
        Self::default()
    }

    pub fn line(&self, line: impl Into<String>) {
        if let Some(tx) = &self.tx {
            // Receiver dropped: nobody is streaming this run
            let _ = tx.send(line.into());
        }
    }
}

/// Opaque executor of one report run.
#[async_trait]
pub trait ExecutionWorker: Clone + Send + Sync + 'static {
    async fn execute(
        &self,
        request: &ExecutionRequest,
        progress: ProgressSink,
    ) -> Result<ExecutionOutput, ExecutionError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ExecutionError, ExecutionOutput, ExecutionRequest, ExecutionWorker, ProgressSink};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use std::time::Duration;

    type Outcome = Result<ExecutionOutput, String>;

    /// Recorded execution
    #[derive(Debug, Clone)]
    pub struct WorkerCall {
        pub request: ExecutionRequest,
    }

    #[derive(Default)]
    struct FakeWorkerState {
        calls: Vec<WorkerCall>,
        /// Per-report queue of outcomes, consumed in order
        scripted: HashMap<String, VecDeque<Outcome>>,
        /// Outcome once a report's queue is empty
        fallback: HashMap<String, Outcome>,
        progress: Vec<String>,
        delay: Option<Duration>,
    }

    /// Scripted worker for tests. Unscripted reports succeed with empty HTML.
    #[derive(Clone, Default)]
    pub struct FakeWorker {
        inner: Arc<Mutex<FakeWorkerState>>,
    }

    impl FakeWorker {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue one outcome for the next run of `report_name`.
        pub fn push(&self, report_name: &str, outcome: Result<ExecutionOutput, &str>) {
            self.inner
                .lock()
                .scripted
                .entry(report_name.to_string())
                .or_default()
                .push_back(outcome.map_err(str::to_string));
        }

        /// Every run of `report_name` succeeds with `output` once the queue drains.
        pub fn always_succeed(&self, report_name: &str, output: ExecutionOutput) {
            self.inner.lock().fallback.insert(report_name.to_string(), Ok(output));
        }

        /// Every run of `report_name` fails with `diagnostic` once the queue drains.
        pub fn always_fail(&self, report_name: &str, diagnostic: &str) {
            self.inner.lock().fallback.insert(report_name.to_string(), Err(diagnostic.to_string()));
        }

        /// Lines reported through the progress sink before each run finishes.
        pub fn emit_progress(&self, lines: &[&str]) {
            self.inner.lock().progress = lines.iter().map(|l| l.to_string()).collect();
        }

        /// Make each run take `delay` (tokio time).
        pub fn set_delay(&self, delay: Duration) {
            self.inner.lock().delay = Some(delay);
        }

        pub fn calls(&self) -> Vec<WorkerCall> {
            self.inner.lock().calls.clone()
        }

        pub fn calls_for(&self, report_name: &str) -> usize {
            self.inner.lock().calls.iter().filter(|c| c.request.report_name == report_name).count()
        }
    }

    #[async_trait]
    impl ExecutionWorker for FakeWorker {
        async fn execute(
            &self,
            request: &ExecutionRequest,
            progress: ProgressSink,
        ) -> Result<ExecutionOutput, ExecutionError> {
            let (outcome, lines, delay) = {
                let mut state = self.inner.lock();
                state.calls.push(WorkerCall { request: request.clone() });
                let queued =
                    state.scripted.get_mut(&request.report_name).and_then(VecDeque::pop_front);
                let outcome = queued
                    .or_else(|| state.fallback.get(&request.report_name).cloned())
                    .unwrap_or_else(|| Ok(ExecutionOutput::default()));
                (outcome, state.progress.clone(), state.delay)
            };
            for line in &lines {
                progress.line(line.as_str());
            }
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            outcome.map_err(ExecutionError::failed)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWorker, WorkerCall};

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
