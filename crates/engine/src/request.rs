// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caller-facing session contract, independent of any transport.

use dv_core::{AgentStatus, LeaseId, LeaseOutcome, ResourceMap, SessionId};
use serde::{Deserialize, Serialize};

/// Lease state as the agent sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportedLeaseState {
    Pending,
    Active,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseReport {
    pub id: LeaseId,
    pub state: ReportedLeaseState,
    /// Set once `Completed`; a completion without one counts as failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<LeaseOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<u8>>,
}

impl LeaseReport {
    pub fn new(id: LeaseId, state: ReportedLeaseState) -> Self {
        Self { id, state, outcome: None, output: None }
    }

    pub fn completed(id: LeaseId, outcome: LeaseOutcome) -> Self {
        Self { id, state: ReportedLeaseState::Completed, outcome: Some(outcome), output: None }
    }
}

/// What an agent sends when it connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStartRequest {
    pub status: AgentStatus,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub resources: ResourceMap,
}

/// What an agent sends on every long-poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdateRequest {
    pub session_id: SessionId,
    pub status: AgentStatus,
    /// `None` keeps the stored properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceMap>,
    #[serde(default)]
    pub leases: Vec<LeaseReport>,
}

impl SessionUpdateRequest {
    pub fn new(session_id: SessionId, status: AgentStatus) -> Self {
        Self { session_id, status, properties: None, resources: None, leases: Vec::new() }
    }

    pub fn with_leases(mut self, leases: Vec<LeaseReport>) -> Self {
        self.leases = leases;
        self
    }
}
