// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-backed cache shared by processes on one host.
//!
//! Each entry is one file named by the SHA-256 of its key, holding the
//! big-endian expiry (epoch ms) followed by the value. Writers fill a
//! uniquely named temp file and rename it into place, so concurrent sets of
//! one key never interleave.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rj_core::Clock;

use super::{CacheBackend, CacheError};

const EXPIRY_LEN: usize = 8;
/// Prefix of in-flight temp files; never a hex digest
const TMP_PREFIX: &str = ".tmp";

pub struct FsCacheBackend<C: Clock> {
    dir: PathBuf,
    clock: C,
}

impl<C: Clock> FsCacheBackend<C> {
    pub fn open(dir: impl Into<PathBuf>, clock: C) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, clock })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        let name: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        self.dir.join(name)
    }
}

fn split(bytes: &[u8]) -> Option<(u64, &[u8])> {
    if bytes.len() < EXPIRY_LEN {
        return None;
    }
    let (head, value) = bytes.split_at(EXPIRY_LEN);
    let expiry: [u8; EXPIRY_LEN] = head.try_into().ok()?;
    Some((u64::from_be_bytes(expiry), value))
}

fn remove_file(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

impl<C: Clock> CacheBackend for FsCacheBackend<C> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match split(&bytes) {
            Some((expires_ms, value)) if expires_ms > self.clock.epoch_ms() => {
                Ok(Some(value.to_vec()))
            }
            Some(_) => {
                remove_file(&path)?;
                Ok(None)
            }
            None => {
                tracing::warn!(key, "truncated cache entry, dropping");
                remove_file(&path)?;
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let expires_ms = self.clock.epoch_ms().saturating_add(ttl.as_millis() as u64);
        let mut tmp = tempfile::Builder::new().prefix(TMP_PREFIX).tempfile_in(&self.dir)?;
        tmp.write_all(&expires_ms.to_be_bytes())?;
        tmp.write_all(&value)?;
        tmp.persist(self.path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        remove_file(&self.path(key))?;
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = self.clock.epoch_ms();
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let in_flight = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(TMP_PREFIX));
            if in_flight {
                continue;
            }
            let expired = match fs::read(&path) {
                Ok(bytes) => split(&bytes).map_or(true, |(expires_ms, _)| expires_ms <= now),
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            };
            if expired && remove_file(&path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
