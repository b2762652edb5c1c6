// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable checkpoint of the job metadata table.
//!
//! The whole table is written as zstd-compressed JSON to a temp file and
//! renamed over the previous checkpoint, so a crash leaves either the old or
//! the new table on disk, never a torn one.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current checkpoint schema version
pub const CURRENT_CHECKPOINT_VERSION: u32 = 1;

const ZSTD_LEVEL: i32 = 3;

/// Errors that can occur in checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported checkpoint version {0}")]
    Version(u32),
}

/// Versioned envelope around checkpointed data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint<T> {
    #[serde(rename = "v")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub data: T,
}

impl<T: Serialize> Checkpoint<T> {
    pub fn new(data: T) -> Self {
        Self { version: CURRENT_CHECKPOINT_VERSION, created_at: Utc::now(), data }
    }

    /// Atomically replace the checkpoint at `path`.
    pub fn write(&self, path: &Path) -> Result<u64, CheckpointError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?;

        let tmp = tmp_path(path);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(compressed.len() as u64)
    }
}

impl<T: DeserializeOwned> Checkpoint<T> {
    /// Load the checkpoint at `path`; `None` when there is none yet.
    pub fn load(path: &Path) -> Result<Option<Self>, CheckpointError> {
        let compressed = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let json = zstd::decode_all(compressed.as_slice())?;
        let checkpoint: Self = serde_json::from_slice(&json)?;
        if checkpoint.version > CURRENT_CHECKPOINT_VERSION {
            return Err(CheckpointError::Version(checkpoint.version));
        }
        Ok(Some(checkpoint))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
