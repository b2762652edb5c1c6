// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short-lived read cache of job snapshots.
//!
//! [`ReportCache`] owns the key format and the retry policy; a
//! [`CacheBackend`] only moves bytes with a TTL.

mod fs;
mod memory;
mod report;

pub use fs::FsCacheBackend;
pub use memory::MemoryCacheBackend;
pub use report::{ReportCache, CACHE_ATTEMPTS};

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Byte-level TTL key/value store.
pub trait CacheBackend: Send + Sync + 'static {
    /// Fetch a live entry; expired entries read as `None`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every expired entry. Returns how many were removed. Backends
    /// that evict on their own keep the default.
    fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(0)
    }
}
