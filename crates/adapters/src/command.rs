// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker that runs a report as an external command.
//!
//! The request is written to the command's stdin as JSON. Each stderr line
//! is run output and is streamed through the progress sink. Stdout is the
//! result: the rendered HTML, or an [`ExecutionOutput`] JSON document with
//! [`OutputFormat::Json`]. A non-zero exit fails the run with the tail of
//! stderr as the diagnostic.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

use crate::worker::{
    ExecutionError, ExecutionOutput, ExecutionRequest, ExecutionWorker, ProgressSink,
};

/// Stderr lines kept in a failure diagnostic
const DIAGNOSTIC_TAIL_LINES: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Stdout is the rendered HTML
    #[default]
    Html,
    /// Stdout is an `ExecutionOutput` JSON document
    Json,
}

#[derive(Debug, Clone)]
pub struct CommandWorker {
    command: String,
    format: OutputFormat,
    env: HashMap<String, String>,
}

impl CommandWorker {
    /// Run `command` with `bash -c`.
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into(), format: OutputFormat::Html, env: HashMap::new() }
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn parse_stdout(&self, stdout: Vec<u8>) -> Result<ExecutionOutput, ExecutionError> {
        match self.format {
            OutputFormat::Html => match String::from_utf8(stdout) {
                Ok(html) => Ok(ExecutionOutput::html(html)),
                Err(e) => Err(ExecutionError::Output(e.to_string())),
            },
            OutputFormat::Json => serde_json::from_slice(&stdout)
                .map_err(|e| ExecutionError::Output(e.to_string())),
        }
    }
}

#[async_trait]
impl ExecutionWorker for CommandWorker {
    async fn execute(
        &self,
        request: &ExecutionRequest,
        progress: ProgressSink,
    ) -> Result<ExecutionOutput, ExecutionError> {
        let payload = serde_json::to_vec(request).map_err(|e| ExecutionError::Output(e.to_string()))?;

        tracing::info!(
            job_id = %request.job_id,
            report = %request.report_name,
            command = %self.command,
            "running report command"
        );

        let mut cmd = tokio::process::Command::new("bash");
        cmd.arg("-c")
            .arg(&self.command)
            .envs(&self.env)
            .env("RJ_JOB_ID", request.job_id.as_str())
            .env("RJ_REPORT_NAME", &request.report_name)
            .env("RJ_GENERATE_PDF", request.generate_pdf.to_string())
            .env("RJ_HIDE_CODE", request.hide_code.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(ExecutionError::Spawn)?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let write_stdin = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(&payload).await {
                    Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
            }
            Ok(())
        };
        let read_stdout = async move {
            let mut buf = Vec::new();
            if let Some(mut stdout) = stdout {
                stdout.read_to_end(&mut buf).await?;
            }
            Ok::<_, io::Error>(buf)
        };
        let read_stderr = async {
            let mut lines = Vec::new();
            if let Some(stderr) = stderr {
                let mut reader = BufReader::new(stderr).lines();
                while let Some(line) = reader.next_line().await? {
                    progress.line(line.as_str());
                    lines.push(line);
                }
            }
            Ok::<_, io::Error>(lines)
        };

        let ((), out, lines, status) =
            tokio::try_join!(write_stdin, read_stdout, read_stderr, child.wait())?;

        if !status.success() {
            let tail = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
            let mut diagnostic = lines[tail..].join("\n");
            if diagnostic.is_empty() {
                diagnostic = format!("report command exited with {}", status);
            }
            tracing::warn!(
                job_id = %request.job_id,
                exit = ?status.code(),
                "report command failed"
            );
            return Err(ExecutionError::failed(diagnostic));
        }

        let mut output = self.parse_stdout(out)?;
        if output.stdout.is_empty() {
            output.stdout = lines;
        }
        Ok(output)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
