// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use rj_core::Clock;

use super::{CacheBackend, CacheError};

struct Entry {
    expires_ms: u64,
    value: Vec<u8>,
}

/// In-process cache backend. Expired entries are dropped on read.
pub struct MemoryCacheBackend<C: Clock> {
    entries: Mutex<HashMap<String, Entry>>,
    clock: C,
}

impl<C: Clock> MemoryCacheBackend<C> {
    pub fn new(clock: C) -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock }
    }

    /// Number of stored entries, live or not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Clock> CacheBackend for MemoryCacheBackend<C> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.clock.epoch_ms();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_ms > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let expires_ms = self.clock.epoch_ms().saturating_add(ttl.as_millis() as u64);
        self.entries.lock().insert(key.to_string(), Entry { expires_ms, value });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = self.clock.epoch_ms();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_ms > now);
        Ok(before - entries.len())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
