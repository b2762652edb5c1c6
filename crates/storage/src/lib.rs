// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for report jobs: the durable job store with its blob area,
//! and the short-lived read cache.

mod blob;
pub mod cache;
mod checkpoint;
mod error;
mod fs_store;
mod store;

#[cfg(any(test, feature = "test-support"))]
mod counting;

pub use blob::{BlobArea, BlobKind};
pub use cache::{CacheBackend, CacheError, FsCacheBackend, MemoryCacheBackend, ReportCache};
pub use checkpoint::{Checkpoint, CheckpointError, CURRENT_CHECKPOINT_VERSION};
pub use error::StoreError;
pub use fs_store::FsJobStore;
pub use store::{DeletedJob, JobQuery, JobStore, NewJob, StatusUpdate};

#[cfg(any(test, feature = "test-support"))]
pub use counting::{CountingStore, StoreCalls};
