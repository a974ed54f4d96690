// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dv-adapters: collaborators the scheduler consumes but does not own.
//!
//! Session history, the lease audit log, work providers, pool configuration
//! and the downtime calendar all sit behind traits here. Each comes with an
//! in-memory backend; work providers also have a scriptable fake under the
//! `test-support` feature.

mod downtime;
mod lease_log;
mod pools;
mod provider;
mod registry;
mod session;
mod window;

pub use downtime::{DowntimeFlag, DowntimeSource};
pub use lease_log::{LeaseLog, LeaseLogError, LeaseLogQuery, LeaseRecord, MemoryLeaseLog};
pub use pools::{PoolSource, PoolSourceError, StaticPoolSource};
pub use provider::{ProviderError, ProviderPolicy, WorkProvider};
pub use registry::ProviderRegistry;
pub use session::{MemorySessionStore, SessionQuery, SessionRecord, SessionStore, SessionStoreError};
pub use window::TimeWindow;

#[cfg(any(test, feature = "test-support"))]
pub use provider::{FakeWorkProvider, ProviderCall};
