// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable audit trail of every lease ever assigned.

use crate::window::TimeWindow;
use async_trait::async_trait;
use dv_core::{Agent, AgentId, Lease, LeaseId, LeaseOutcome, LogId, PoolId, SessionId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from lease audit operations
#[derive(Debug, Error)]
pub enum LeaseLogError {
    #[error("lease record not found: {0}")]
    NotFound(LeaseId),
    #[error("lease log backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub id: LeaseId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<LeaseId>,
    pub agent_id: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<PoolId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<LogId>,
    pub payload_type: String,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<LeaseOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<u8>>,
}

impl LeaseRecord {
    /// An unfinished record for `lease` as attached to `agent`.
    pub fn started(agent: &Agent, lease: &Lease) -> Self {
        Self {
            id: lease.id.clone(),
            parent_id: lease.parent_id.clone(),
            agent_id: agent.id.clone(),
            session_id: agent.session_id.clone(),
            name: lease.name.clone(),
            pool_id: lease.pool_id.clone(),
            log_id: lease.log_id.clone(),
            payload_type: lease.payload.type_tag.clone(),
            started_at_ms: lease.started_at_ms,
            finished_at_ms: None,
            outcome: None,
            output: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Filter for [`LeaseLog::find`]; records come back newest first.
#[derive(Debug, Clone, Default)]
pub struct LeaseLogQuery {
    pub agent_id: Option<AgentId>,
    pub session_id: Option<SessionId>,
    pub parent_id: Option<LeaseId>,
    /// Matched against the start time
    pub window: TimeWindow,
    pub unfinished_only: bool,
    pub index: usize,
    pub count: Option<usize>,
}

impl LeaseLogQuery {
    fn matches(&self, record: &LeaseRecord) -> bool {
        self.agent_id.as_ref().is_none_or(|a| &record.agent_id == a)
            && self.session_id.as_ref().is_none_or(|s| record.session_id.as_ref() == Some(s))
            && self.parent_id.as_ref().is_none_or(|p| record.parent_id.as_ref() == Some(p))
            && self.window.contains(record.started_at_ms)
            && (!self.unfinished_only || !record.is_finished())
    }
}

#[async_trait]
pub trait LeaseLog: Send + Sync + 'static {
    async fn add(&self, record: LeaseRecord) -> Result<(), LeaseLogError>;

    /// Record the final outcome. Returns false if the lease was already
    /// finished, in which case the first outcome stands.
    async fn finish(
        &self,
        id: &LeaseId,
        outcome: LeaseOutcome,
        finished_at_ms: u64,
        output: Option<Vec<u8>>,
    ) -> Result<bool, LeaseLogError>;

    async fn get(&self, id: &LeaseId) -> Result<Option<LeaseRecord>, LeaseLogError>;

    async fn find(&self, query: &LeaseLogQuery) -> Result<Vec<LeaseRecord>, LeaseLogError>;
}

#[derive(Default)]
pub struct MemoryLeaseLog {
    records: Mutex<HashMap<LeaseId, LeaseRecord>>,
}

impl MemoryLeaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl LeaseLog for MemoryLeaseLog {
    async fn add(&self, record: LeaseRecord) -> Result<(), LeaseLogError> {
        self.records.lock().insert(record.id.clone(), record);
        Ok(())
    }

    async fn finish(
        &self,
        id: &LeaseId,
        outcome: LeaseOutcome,
        finished_at_ms: u64,
        output: Option<Vec<u8>>,
    ) -> Result<bool, LeaseLogError> {
        let mut records = self.records.lock();
        let record = records.get_mut(id).ok_or_else(|| LeaseLogError::NotFound(id.clone()))?;
        if record.is_finished() {
            return Ok(false);
        }
        record.outcome = Some(outcome);
        record.finished_at_ms = Some(finished_at_ms);
        record.output = output;
        Ok(true)
    }

    async fn get(&self, id: &LeaseId) -> Result<Option<LeaseRecord>, LeaseLogError> {
        Ok(self.records.lock().get(id).cloned())
    }

    async fn find(&self, query: &LeaseLogQuery) -> Result<Vec<LeaseRecord>, LeaseLogError> {
        let records = self.records.lock();
        let mut matched: Vec<&LeaseRecord> = records.values().filter(|r| query.matches(r)).collect();
        matched.sort_by(|a, b| b.started_at_ms.cmp(&a.started_at_ms).then_with(|| a.id.cmp(&b.id)));
        Ok(matched
            .into_iter()
            .skip(query.index)
            .take(query.count.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "lease_log_tests.rs"]
mod tests;
