// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rj_core::{JobId, JobStatus};
use thiserror::Error;

use crate::checkpoint::CheckpointError;

/// Errors from job store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// `Done` must be written with its payload through `save_result`.
    #[error("job {job_id}: status DONE can only be set by saving a complete result")]
    DoneRequiresSaveResult { job_id: JobId },

    /// Ids are only reused once the previous job is deleted.
    #[error("job {job_id} already exists with status {status}")]
    AlreadyExists { job_id: JobId, status: JobStatus },

    #[error("job {job_id}: illegal transition {from} -> {to}")]
    IllegalTransition { job_id: JobId, from: JobStatus, to: JobStatus },

    #[error("job {job_id}: save_result needs a finished run, got {status}")]
    NotFinished { job_id: JobId, status: JobStatus },
}
