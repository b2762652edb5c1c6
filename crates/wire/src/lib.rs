// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payloads returned to clients polling report jobs.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod status;
mod summary;

pub use status::{results_url, StatusResponse, JOB_NOT_FOUND, NOT_FOUND_FOR_OVERRIDES};
pub use summary::JobSummary;
