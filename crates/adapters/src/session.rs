// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session history records.

use crate::window::TimeWindow;
use async_trait::async_trait;
use dv_core::{AgentId, PoolId, SessionId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from session record operations
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session not found: {0}")]
    NotFound(SessionId),
    #[error("session already exists: {0}")]
    Duplicate(SessionId),
    #[error("session store backend error: {0}")]
    Backend(String),
}

/// One agent session as kept for history; the live state is on the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub agent_id: AgentId,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub pools: Vec<PoolId>,
}

impl SessionRecord {
    pub fn new(id: SessionId, agent_id: AgentId, started_at_ms: u64) -> Self {
        Self { id, agent_id, started_at_ms, finished_at_ms: None, properties: Vec::new(), pools: Vec::new() }
    }
}

/// Filter for [`SessionStore::find`]; records come back newest first.
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    pub agent_id: Option<AgentId>,
    /// Matched against the start time
    pub window: TimeWindow,
    pub index: usize,
    pub count: Option<usize>,
}

#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn create(&self, record: SessionRecord) -> Result<(), SessionStoreError>;

    async fn finish(&self, id: &SessionId, finished_at_ms: u64) -> Result<(), SessionStoreError>;

    /// Remove a record outright, e.g. one created for a start that lost its race.
    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError>;

    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionStoreError>;

    async fn find(&self, query: &SessionQuery) -> Result<Vec<SessionRecord>, SessionStoreError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<SessionId, SessionRecord>>,
}

impl MemorySessionStore {
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
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: SessionRecord) -> Result<(), SessionStoreError> {
        let mut records = self.records.lock();
        if records.contains_key(&record.id) {
            return Err(SessionStoreError::Duplicate(record.id));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn finish(&self, id: &SessionId, finished_at_ms: u64) -> Result<(), SessionStoreError> {
        let mut records = self.records.lock();
        let record = records.get_mut(id).ok_or_else(|| SessionStoreError::NotFound(id.clone()))?;
        record.finished_at_ms.get_or_insert(finished_at_ms);
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        self.records.lock().remove(id);
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionStoreError> {
        Ok(self.records.lock().get(id).cloned())
    }

    async fn find(&self, query: &SessionQuery) -> Result<Vec<SessionRecord>, SessionStoreError> {
        let records = self.records.lock();
        let mut matched: Vec<&SessionRecord> = records
            .values()
            .filter(|r| query.agent_id.as_ref().is_none_or(|a| &r.agent_id == a))
            .filter(|r| query.window.contains(r.started_at_ms))
            .collect();
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
#[path = "session_tests.rs"]
mod tests;
