// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the collaborators a report job talks to: the worker that
//! executes a report and the mail notifier that delivers the outcome.

mod command;
mod notify;
mod worker;

pub use command::{CommandWorker, OutputFormat};
pub use notify::{
    LogMailNotifier, MailAttachment, MailMessage, MailNotifier, NotifyError, DEFAULT_MAILFROM,
};
pub use worker::{ExecutionError, ExecutionOutput, ExecutionRequest, ExecutionWorker, ProgressSink};

#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeMailNotifier;
#[cfg(any(test, feature = "test-support"))]
pub use worker::{FakeWorker, WorkerCall};
