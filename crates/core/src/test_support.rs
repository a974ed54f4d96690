// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Agent, AgentId, AgentStatus, Lease, LeasePayload, ResourceMap, SessionId};

/// Epoch used by [`crate::FakeClock::new`].
pub const T0: u64 = 1_000_000;

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::{AgentStatus, ResourceMap};
    use proptest::prelude::*;

    pub fn arb_agent_status() -> impl Strategy<Value = AgentStatus> {
        prop_oneof![
            Just(AgentStatus::Unspecified),
            Just(AgentStatus::Ok),
            Just(AgentStatus::Busy),
            Just(AgentStatus::Unhealthy),
            Just(AgentStatus::Stopping),
            Just(AgentStatus::Stopped),
        ]
    }

    /// Up to three resources drawn from a small fixed vocabulary.
    pub fn arb_resources(max: i32) -> impl Strategy<Value = ResourceMap> {
        proptest::collection::btree_map(
            prop_oneof![Just("cpu".to_string()), Just("ram".to_string()), Just("gpu".to_string())],
            0..=max,
            0..=3,
        )
    }
}

// ── Factories ───────────────────────────────────────────────────────────

pub fn resources(items: &[(&str, i32)]) -> ResourceMap {
    items.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub fn properties(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Registered agent without a session.
pub fn agent(id: &str) -> Agent {
    Agent::new(AgentId::new(id), format!("key-{id}"), false, T0)
}

/// Agent with a live `Ok` session expiring `lifetime_ms` after [`T0`].
pub fn agent_in_session(id: &str, lifetime_ms: u64) -> Agent {
    let mut agent = agent(id);
    agent.session_id = Some(SessionId::new());
    agent.session_expires_at_ms = Some(T0 + lifetime_ms);
    agent.status = AgentStatus::Ok;
    agent.update_index = 1;
    agent
}

pub fn lease(name: &str) -> Lease {
    Lease::new(name, LeasePayload::new("test", Vec::new()), T0)
}

pub fn lease_with(name: &str, reserved: &[(&str, i32)], exclusive: bool) -> Lease {
    lease(name).with_resources(resources(reserved)).with_exclusive(exclusive)
}
