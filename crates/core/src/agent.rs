// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent document: one record of truth per build machine.
//!
//! Every write to an agent goes through a conditional update keyed on
//! [`Agent::update_index`]; see `dv-storage` for the protocol. The helpers
//! here are pure reads over a snapshot.

use crate::id::{AgentId, PoolId, SessionId};
use crate::lease::{Lease, ResourceMap};
use crate::properties::PropertySet;
use serde::{Deserialize, Serialize};

/// Status reported by the agent on each session update.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Unspecified,
    /// Ready for work
    Ok,
    /// Machine is in use by something outside the farm (e.g. an interactive user)
    Busy,
    Unhealthy,
    /// Draining: finish or abandon leases, then end the session
    Stopping,
    /// No session
    Stopped,
}

crate::simple_display! {
    AgentStatus {
        Unspecified => "unspecified",
        Ok => "ok",
        Busy => "busy",
        Unhealthy => "unhealthy",
        Stopping => "stopping",
        Stopped => "stopped",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Binds the current registration; blank once soft-deleted
    pub enrollment_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_expires_at_ms: Option<u64>,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub last_status_change_ms: u64,

    /// Operator-assigned pools
    #[serde(default)]
    pub explicit_pools: Vec<PoolId>,
    /// Pools recomputed from properties at each session start/update
    #[serde(default)]
    pub dynamic_pools: Vec<PoolId>,

    /// Sorted `key=value` capability strings
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub resources: ResourceMap,

    #[serde(default)]
    pub leases: Vec<Lease>,

    pub enabled: bool,
    #[serde(default)]
    pub ephemeral: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub request_conform: bool,
    #[serde(default)]
    pub request_full_conform: bool,
    #[serde(default)]
    pub request_restart: bool,
    #[serde(default)]
    pub request_shutdown: bool,
    #[serde(default)]
    pub request_force_restart: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_shutdown_reason: Option<String>,

    #[serde(default)]
    pub conform_attempt_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_conform_at_ms: Option<u64>,
    #[serde(default)]
    pub upgrade_attempt_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_upgrade_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_upgrade_at_ms: Option<u64>,

    /// Incremented by exactly one on every successful write
    pub update_index: u32,
    pub updated_at_ms: u64,
}

impl Agent {
    /// A freshly registered agent: enabled, no session, update index 0.
    pub fn new(id: AgentId, enrollment_key: impl Into<String>, ephemeral: bool, now_ms: u64) -> Self {
        Self {
            id,
            enrollment_key: enrollment_key.into(),
            session_id: None,
            session_expires_at_ms: None,
            status: AgentStatus::Stopped,
            last_status_change_ms: now_ms,
            explicit_pools: Vec::new(),
            dynamic_pools: Vec::new(),
            properties: Vec::new(),
            resources: ResourceMap::new(),
            leases: Vec::new(),
            enabled: true,
            ephemeral,
            deleted: false,
            comment: None,
            request_conform: false,
            request_full_conform: false,
            request_restart: false,
            request_shutdown: false,
            request_force_restart: false,
            last_shutdown_reason: None,
            conform_attempt_count: 0,
            last_conform_at_ms: None,
            upgrade_attempt_count: 0,
            last_upgrade_version: None,
            last_upgrade_at_ms: None,
            update_index: 0,
            updated_at_ms: now_ms,
        }
    }

    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }

    /// True while a session exists and its expiry is still ahead of `now_ms`.
    pub fn is_session_valid(&self, now_ms: u64) -> bool {
        self.session_id.is_some() && self.session_expires_at_ms.is_some_and(|at| at > now_ms)
    }

    /// Explicit and dynamic pools, explicit first, without duplicates.
    pub fn pools(&self) -> impl Iterator<Item = &PoolId> {
        self.explicit_pools
            .iter()
            .chain(self.dynamic_pools.iter().filter(|p| !self.explicit_pools.contains(p)))
    }

    pub fn in_pool(&self, pool: &PoolId) -> bool {
        self.explicit_pools.contains(pool) || self.dynamic_pools.contains(pool)
    }

    pub fn property_set(&self) -> PropertySet {
        PropertySet::new(&self.properties)
    }

    pub fn find_lease(&self, lease_id: &str) -> Option<(usize, &Lease)> {
        self.leases.iter().enumerate().find(|(_, l)| l.id == lease_id)
    }

    pub fn has_exclusive_lease(&self) -> bool {
        self.leases.iter().any(|l| l.exclusive)
    }

    /// Sum of every resource reserved by the current leases.
    pub fn reserved_resources(&self) -> ResourceMap {
        let mut reserved = ResourceMap::new();
        for lease in &self.leases {
            for (name, amount) in &lease.resources {
                let total = reserved.entry(name.clone()).or_default();
                *total = total.saturating_add(*amount);
            }
        }
        reserved
    }

    /// Unreserved amount of one advertised resource.
    pub fn remaining_resource(&self, name: &str) -> i32 {
        let advertised = self.resources.get(name).copied().unwrap_or(0);
        let reserved = self
            .leases
            .iter()
            .filter_map(|l| l.resources.get(name))
            .fold(0i32, |total, amount| total.saturating_add(*amount));
        advertised.saturating_sub(reserved)
    }

    /// Whether `lease` can be attached without breaking exclusivity or
    /// over-committing resources. Negative reservations are never admitted.
    pub fn admits(&self, lease: &Lease) -> bool {
        if self.has_exclusive_lease() || (lease.exclusive && !self.leases.is_empty()) {
            return false;
        }
        lease.resources.iter().all(|(name, amount)| (0..=self.remaining_resource(name)).contains(amount))
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
