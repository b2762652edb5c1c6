// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rj_core::JobId;
use rj_storage::{CacheError, StoreError};
use thiserror::Error;

/// Errors from running a job
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Every attempt failed; the last failure is persisted as `ERROR`.
    #[error("job {job_id} failed after {attempts} attempt(s): {diagnostic}")]
    Execution { job_id: JobId, attempts: u32, diagnostic: String },

    #[error("job {job_id} is not in the store")]
    UnknownJob { job_id: JobId },
}

/// Errors from one hunter iteration
#[derive(Debug, Error)]
pub enum HunterError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
