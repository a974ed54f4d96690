// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dv-storage: the agent record store.
//!
//! One document per agent, mutated only through conditional writes matched on
//! `(agent id, update index)`. A write that loses the race returns `None` and
//! the caller re-reads and recomputes; nothing here ever locks an agent
//! pessimistically.

mod channel;
mod collection;
mod counters;
mod error;
mod lease_index;
mod memory;
mod query;
mod retry;
mod store;
mod update;

pub use channel::{Subscription, UpdateChannel};
pub use collection::{AgentCollection, AgentSettings, SessionChanges, SessionStart};
pub use counters::{CounterUpdate, PayloadCounters};
pub use error::StoreError;
pub use lease_index::ActiveLeaseIndex;
pub use memory::MemoryAgentStore;
pub use query::{AgentQuery, DeletedMode};
pub use retry::update_with_retry;
pub use store::AgentStore;
pub use update::AgentUpdate;
