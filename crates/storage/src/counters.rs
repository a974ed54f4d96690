// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-payload-type diagnostic counters bumped when a lease is attached.

use crate::update::AgentUpdate;
use dv_core::{Agent, ConformPayload, LeasePayload, UpgradePayload};
use std::collections::HashMap;

/// Adds counter fields to the delta that attaches a lease.
pub type CounterUpdate = fn(&Agent, &LeasePayload, u64, &mut AgentUpdate);

/// Lookup table from payload type tag to its counter update.
#[derive(Clone)]
pub struct PayloadCounters {
    table: HashMap<String, CounterUpdate>,
}

impl PayloadCounters {
    pub fn empty() -> Self {
        Self { table: HashMap::new() }
    }

    pub fn register(mut self, type_tag: impl Into<String>, update: CounterUpdate) -> Self {
        self.table.insert(type_tag.into(), update);
        self
    }

    pub fn apply(&self, agent: &Agent, payload: &LeasePayload, now_ms: u64, update: &mut AgentUpdate) {
        if let Some(counter) = self.table.get(&payload.type_tag) {
            counter(agent, payload, now_ms, update);
        }
    }
}

impl Default for PayloadCounters {
    fn default() -> Self {
        Self::empty()
            .register(ConformPayload::TYPE_TAG, count_conform)
            .register(UpgradePayload::TYPE_TAG, count_upgrade)
    }
}

fn count_conform(agent: &Agent, _: &LeasePayload, now_ms: u64, update: &mut AgentUpdate) {
    update.conform_attempt_count = Some(agent.conform_attempt_count.saturating_add(1));
    update.last_conform_at_ms = Some(Some(now_ms));
}

/// Consecutive attempts at the same version accumulate; a new version
/// restarts the count at one.
fn count_upgrade(agent: &Agent, payload: &LeasePayload, now_ms: u64, update: &mut AgentUpdate) {
    let version = match UpgradePayload::decode(payload) {
        Ok(upgrade) => Some(upgrade.version),
        Err(e) => {
            tracing::warn!(agent = %agent.id, error = %e, "undecodable upgrade payload");
            None
        }
    };
    let count = if version.is_some() && version == agent.last_upgrade_version {
        agent.upgrade_attempt_count.saturating_add(1)
    } else {
        1
    };
    update.upgrade_attempt_count = Some(count);
    update.last_upgrade_version = Some(version);
    update.last_upgrade_at_ms = Some(Some(now_ms));
}

#[cfg(test)]
#[path = "counters_tests.rs"]
mod tests;
