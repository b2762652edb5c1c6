// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rj daemon library
//!
//! Wires the store, cache and engine into a process: configuration from the
//! environment, the exclusive state-dir lock, logging and the `rjd` commands.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod commands;
pub mod env;
pub mod lifecycle;
pub mod logging;
pub mod output;

pub use commands::{Cli, Command};
pub use lifecycle::{attach, startup, Config, Daemon, LifecycleError};
