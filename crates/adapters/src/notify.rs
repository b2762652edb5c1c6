// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use thiserror::Error;

use rj_core::JobRecord;

/// Sender used when a job does not name one
pub const DEFAULT_MAILFROM: &str = "rj@localhost";

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Outcome mail for one finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<MailAttachment>,
}

impl MailMessage {
    /// Build the outcome mail for `record`; `None` when it has no recipients.
    pub fn for_record(record: &JobRecord) -> Option<Self> {
        let to = record.delivery.recipients();
        if to.is_empty() {
            return None;
        }
        let subject = match record.completed() {
            Some(run) if !run.email_subject.is_empty() => run.email_subject.clone(),
            _ => format!(
                "{} report completed with status: {}",
                record.report_title,
                record.status().label()
            ),
        };
        let attachments = match record.completed() {
            Some(run) if !run.pdf.is_empty() => vec![MailAttachment {
                file_name: pdf_file_name(record),
                bytes: run.pdf.clone(),
            }],
            _ => Vec::new(),
        };
        Some(Self {
            from: record.delivery.mailfrom.clone().unwrap_or_else(|| DEFAULT_MAILFROM.to_string()),
            to,
            subject,
            html_body: record.email_html().into_owned(),
            attachments,
        })
    }
}

/// `{report_name}_{start time}.pdf`, with path separators replaced by `^`.
fn pdf_file_name(record: &JobRecord) -> String {
    let started = chrono::DateTime::from_timestamp_millis(record.job_start_time_ms as i64)
        .map(|t| t.format("%Y-%m-%dT%H%M%S").to_string())
        .unwrap_or_default();
    format!("{}_{}.pdf", record.report_name.replace('/', "^"), started)
}

/// Adapter for delivering outcome mails
#[async_trait]
pub trait MailNotifier: Clone + Send + Sync + 'static {
    async fn notify(&self, message: &MailMessage) -> Result<(), NotifyError>;
}

/// Notifier that only logs what it would send.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailNotifier;

#[async_trait]
impl MailNotifier for LogMailNotifier {
    async fn notify(&self, message: &MailMessage) -> Result<(), NotifyError> {
        tracing::info!(
            to = %message.to.join(","),
            from = %message.from,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "outcome mail"
        );
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{MailMessage, MailNotifier, NotifyError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeMailState {
        sent: Vec<MailMessage>,
        fail: bool,
    }

    /// Fake mail notifier for testing
    #[derive(Clone, Default)]
    pub struct FakeMailNotifier {
        inner: Arc<Mutex<FakeMailState>>,
    }

    impl FakeMailNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every send fail
        pub fn fail_sends(&self) {
            self.inner.lock().fail = true;
        }

        /// Every message passed to `notify`, including failed sends
        pub fn sent(&self) -> Vec<MailMessage> {
            self.inner.lock().sent.clone()
        }
    }

    #[async_trait]
    impl MailNotifier for FakeMailNotifier {
        async fn notify(&self, message: &MailMessage) -> Result<(), NotifyError> {
            let mut state = self.inner.lock();
            state.sent.push(message.clone());
            if state.fail {
                return Err(NotifyError::SendFailed("smtp unavailable".to_string()));
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMailNotifier;

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
