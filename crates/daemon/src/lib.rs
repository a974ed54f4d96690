// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drover daemon library
//!
//! Wires the scheduler to its in-process collaborators and reads the
//! daemon's configuration from the environment.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;

mod daemon;
mod error;
mod logging;
mod pools_file;

pub use daemon::{Daemon, DaemonScheduler};
pub use error::DaemonError;
pub use logging::init_logging;
pub use pools_file::{load_pools, parse_pools};
