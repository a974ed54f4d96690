// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dv-engine: the lease scheduler.
//!
//! Drives agent sessions through their lifecycle, hands out leases by racing
//! every eligible work provider inside a bounded long-poll, and sweeps up
//! after agents that disappear without saying goodbye.

mod config;
mod conform;
mod error;
mod metrics;
mod pools;
mod reconcile;
mod request;
mod scheduler;
mod waiters;

#[cfg(test)]
mod test_helpers;

pub use config::SchedulerConfig;
pub use conform::ConformProvider;
pub use error::SchedulerError;
pub use metrics::AgentMetrics;
pub use pools::PoolCache;
pub use reconcile::{plan_session_update, FinishedLease, SessionPlan};
pub use request::{LeaseReport, ReportedLeaseState, SessionStartRequest, SessionUpdateRequest};
pub use scheduler::{LeaseScheduler, MaintenanceReport, SchedulerDeps};
pub use waiters::{WaiterGuard, WaiterTable};
