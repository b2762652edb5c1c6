// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rj_core::test_support::pending;
use rj_core::FakeClock;

#[yare::parameterized(
    zero = { 0, "-" },
    epoch_start = { FakeClock::START_MS, "2018-01-12 00:00:00" },
    with_seconds = { FakeClock::START_MS + 3_723_000, "2018-01-12 01:02:03" },
)]
fn formats_epoch_ms(epoch_ms: u64, expected: &str) {
    assert_eq!(format_epoch_ms(epoch_ms), expected);
}

#[test]
fn job_line_has_id_status_and_report() {
    let line = format_job_line(&pending("j1", "sales/daily", FakeClock::START_MS));
    assert!(line.starts_with("j1 "));
    assert!(line.contains("pending"));
    assert!(line.contains("sales/daily"));
    assert!(line.ends_with("2018-01-12 00:00:00"));
}
