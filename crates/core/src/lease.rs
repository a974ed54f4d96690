// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leases: units of work embedded in an agent document.

use crate::id::{LeaseId, LogId, PoolId};
use crate::payload::LeasePayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named integer resource counts (advertised by agents, reserved by leases)
pub type ResourceMap = BTreeMap<String, i32>;

/// Lifecycle state of a lease as tracked on the agent document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseState {
    /// Assigned but not yet acknowledged by the agent
    #[default]
    Pending,
    /// Agent confirmed it is executing the lease
    Active,
    /// Server asked the agent to abandon the lease
    Cancelled,
}

crate::simple_display! {
    LeaseState {
        Pending => "pending",
        Active => "active",
        Cancelled => "cancelled",
    }
}

/// Final result of a lease, recorded when it leaves the agent document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseOutcome {
    Success,
    Failure,
    Cancelled,
}

crate::simple_display! {
    LeaseOutcome {
        Success => "success",
        Failure => "failure",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<LeaseId>,
    pub name: String,
    #[serde(default)]
    pub state: LeaseState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<PoolId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<LogId>,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<u64>,
    #[serde(default)]
    pub exclusive: bool,
    /// Resources reserved while this lease is held
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: ResourceMap,
    pub payload: LeasePayload,
}

impl Lease {
    /// A pending, non-exclusive lease with no reservations.
    pub fn new(name: impl Into<String>, payload: LeasePayload, started_at_ms: u64) -> Self {
        Self {
            id: LeaseId::new(),
            parent_id: None,
            name: name.into(),
            state: LeaseState::Pending,
            stream_id: None,
            pool_id: None,
            log_id: None,
            started_at_ms,
            expires_at_ms: None,
            exclusive: false,
            resources: ResourceMap::new(),
            payload,
        }
    }

    pub fn with_resources(mut self, resources: ResourceMap) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn with_parent(mut self, parent_id: LeaseId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}
