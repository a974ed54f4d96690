// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process agent store.

use crate::error::StoreError;
use crate::query::AgentQuery;
use crate::store::AgentStore;
use crate::update::AgentUpdate;
use async_trait::async_trait;
use dv_core::{Agent, AgentId};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// [`AgentStore`] backed by an id-ordered map behind a mutex.
///
/// The compare-and-apply in [`AgentStore::update_if`] happens under a single
/// lock acquisition, which gives the same atomicity a document database's
/// filtered update does.
#[derive(Default)]
pub struct MemoryAgentStore {
    agents: Mutex<BTreeMap<AgentId, Agent>>,
}

impl MemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.agents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.lock().is_empty()
    }
}

#[async_trait]
impl AgentStore for MemoryAgentStore {
    async fn get(&self, id: &AgentId) -> Result<Option<Agent>, StoreError> {
        Ok(self.agents.lock().get(id).cloned())
    }

    async fn find(&self, query: &AgentQuery) -> Result<Vec<Agent>, StoreError> {
        Ok(query.paginate(self.agents.lock().values()))
    }

    async fn find_expired(&self, now_ms: u64, limit: usize) -> Result<Vec<Agent>, StoreError> {
        let agents = self.agents.lock();
        let mut expired: Vec<&Agent> = agents
            .values()
            .filter(|a| a.session_expires_at_ms.is_some_and(|at| at <= now_ms))
            .collect();
        expired.sort_by_key(|a| a.session_expires_at_ms);
        Ok(expired.into_iter().take(limit).cloned().collect())
    }

    async fn insert(&self, agent: &Agent) -> Result<bool, StoreError> {
        let mut agents = self.agents.lock();
        if agents.contains_key(&agent.id) {
            return Ok(false);
        }
        agents.insert(agent.id.clone(), agent.clone());
        Ok(true)
    }

    async fn update_if(
        &self,
        id: &AgentId,
        expected_index: u32,
        update: &AgentUpdate,
        now_ms: u64,
    ) -> Result<Option<Agent>, StoreError> {
        let mut agents = self.agents.lock();
        let Some(stored) = agents.get_mut(id) else {
            return Ok(None);
        };
        if stored.update_index != expected_index {
            return Ok(None);
        }
        update.apply_to(stored);
        stored.update_index = stored.update_index.wrapping_add(1);
        stored.updated_at_ms = now_ms;
        Ok(Some(stored.clone()))
    }

    async fn remove(&self, id: &AgentId) -> Result<bool, StoreError> {
        Ok(self.agents.lock().remove(id).is_some())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
