// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rj_core::FakeClock;

#[test]
fn entries_expire_after_ttl() {
    let clock = FakeClock::new();
    let cache = MemoryCacheBackend::new(clock.clone());
    cache.set("k", b"v".to_vec(), Duration::from_secs(5)).unwrap();

    clock.advance(Duration::from_millis(4_999));
    assert_eq!(cache.get("k").unwrap(), Some(b"v".to_vec()));

    clock.advance(Duration::from_millis(1));
    assert_eq!(cache.get("k").unwrap(), None);
    assert!(cache.is_empty());
}

#[test]
fn set_overwrites_and_remove_clears() {
    let cache = MemoryCacheBackend::new(FakeClock::new());
    cache.set("k", b"a".to_vec(), Duration::from_secs(5)).unwrap();
    cache.set("k", b"b".to_vec(), Duration::from_secs(5)).unwrap();
    assert_eq!(cache.get("k").unwrap(), Some(b"b".to_vec()));
    assert_eq!(cache.len(), 1);

    cache.remove("k").unwrap();
    assert_eq!(cache.get("k").unwrap(), None);
}

#[test]
fn purge_drops_only_expired_entries() {
    let clock = FakeClock::new();
    let cache = MemoryCacheBackend::new(clock.clone());
    cache.set("short", b"1".to_vec(), Duration::from_secs(1)).unwrap();
    cache.set("long", b"2".to_vec(), Duration::from_secs(60)).unwrap();

    clock.advance(Duration::from_secs(2));

    assert_eq!(cache.purge_expired().unwrap(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("long").unwrap(), Some(b"2".to_vec()));
}
