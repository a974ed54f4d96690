// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dv-core: data model shared by the Drover agent store and lease scheduler

pub mod macros;

pub mod agent;
pub mod clock;
pub mod condition;
pub mod id;
pub mod lease;
pub mod payload;
pub mod pool;
pub mod properties;
pub mod requirements;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{Agent, AgentStatus};
pub use clock::{Clock, FakeClock, SystemClock};
pub use condition::{Condition, ConditionError};
pub use id::{AgentId, LeaseId, LogId, PoolId, SessionId};
pub use lease::{Lease, LeaseOutcome, LeaseState, ResourceMap};
pub use payload::{ConformPayload, LeasePayload, PayloadError, UpgradePayload};
pub use pool::Pool;
pub use properties::{PropertySet, REQUESTED_POOLS_PROPERTY};
pub use requirements::{AgentRequirements, ResourceRequirement};
