// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rj-core: Job records, statuses and shared primitives for report jobs

pub mod macros;

pub mod clock;
pub mod id;
pub mod overrides;
pub mod record;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::JobId;
pub use overrides::{expand_overrides, Overrides, OverridesError};
#[cfg(any(test, feature = "test-support"))]
pub use record::JobRecordBuilder;
pub use record::{CompletedRun, Delivery, JobRecord, JobState, CANCEL_MESSAGE};
pub use status::{JobStatus, ParseStatusError};
