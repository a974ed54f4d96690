// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lookup cache from lease id to the agent holding it.
//!
//! The agent documents stay the source of truth; entries here expire after a
//! TTL and the whole index can be rebuilt from a scan.

use dv_core::{Agent, AgentId, Clock, Lease, LeaseId};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

struct Holder {
    agent_id: AgentId,
    parent_id: Option<LeaseId>,
    expires_at_ms: u64,
}

struct Children {
    ids: BTreeSet<LeaseId>,
    expires_at_ms: u64,
}

#[derive(Default)]
struct IndexState {
    holders: HashMap<LeaseId, Holder>,
    children: HashMap<LeaseId, Children>,
}

pub struct ActiveLeaseIndex<C: Clock> {
    clock: C,
    ttl: Duration,
    state: Mutex<IndexState>,
}

impl<C: Clock> ActiveLeaseIndex<C> {
    pub fn new(clock: C, ttl: Duration) -> Self {
        Self { clock, ttl, state: Mutex::new(IndexState::default()) }
    }

    fn expiry(&self) -> u64 {
        self.clock.epoch_ms().saturating_add(self.ttl.as_millis() as u64)
    }

    pub fn add(&self, agent_id: &AgentId, lease: &Lease) {
        let expires_at_ms = self.expiry();
        let mut state = self.state.lock();
        state.holders.insert(
            lease.id.clone(),
            Holder { agent_id: agent_id.clone(), parent_id: lease.parent_id.clone(), expires_at_ms },
        );
        if let Some(parent) = &lease.parent_id {
            let children = state
                .children
                .entry(parent.clone())
                .or_insert_with(|| Children { ids: BTreeSet::new(), expires_at_ms });
            children.ids.insert(lease.id.clone());
            children.expires_at_ms = expires_at_ms;
        }
    }

    pub fn remove(&self, lease_id: &LeaseId) {
        let mut state = self.state.lock();
        let Some(holder) = state.holders.remove(lease_id) else {
            return;
        };
        if let Some(parent) = holder.parent_id {
            if let Some(children) = state.children.get_mut(&parent) {
                children.ids.remove(lease_id);
                if children.ids.is_empty() {
                    state.children.remove(&parent);
                }
            }
        }
    }

    /// Drop every entry held by `agent_id`.
    pub fn remove_agent(&self, agent_id: &AgentId) {
        let lease_ids: Vec<LeaseId> = {
            let state = self.state.lock();
            state
                .holders
                .iter()
                .filter(|(_, h)| &h.agent_id == agent_id)
                .map(|(id, _)| id.clone())
                .collect()
        };
        for lease_id in &lease_ids {
            self.remove(lease_id);
        }
    }

    /// Agent currently holding `lease_id`, if the entry is still fresh.
    pub fn agent_for(&self, lease_id: &LeaseId) -> Option<AgentId> {
        let now = self.clock.epoch_ms();
        let mut state = self.state.lock();
        match state.holders.get(lease_id) {
            Some(h) if h.expires_at_ms > now => Some(h.agent_id.clone()),
            Some(_) => {
                state.holders.remove(lease_id);
                None
            }
            None => None,
        }
    }

    pub fn children(&self, parent_id: &LeaseId) -> Vec<LeaseId> {
        let now = self.clock.epoch_ms();
        let mut state = self.state.lock();
        match state.children.get(parent_id) {
            Some(c) if c.expires_at_ms > now => c.ids.iter().cloned().collect(),
            Some(_) => {
                state.children.remove(parent_id);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Replace the index contents with the leases on `agents`.
    pub fn rebuild<'a>(&self, agents: impl IntoIterator<Item = &'a Agent>) {
        *self.state.lock() = IndexState::default();
        for agent in agents {
            for lease in &agent.leases {
                self.add(&agent.id, lease);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "lease_index_tests.rs"]
mod tests;
