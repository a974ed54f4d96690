// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence contract for agent documents.

use crate::error::StoreError;
use crate::query::AgentQuery;
use crate::update::AgentUpdate;
use async_trait::async_trait;
use dv_core::{Agent, AgentId};

/// Backend holding one document per agent.
///
/// The only mutation besides insert/remove is [`AgentStore::update_if`], a
/// conditional write: it applies the whole delta, bumps the update index by
/// one and stamps the update time, or does nothing at all.
#[async_trait]
pub trait AgentStore: Send + Sync + 'static {
    async fn get(&self, id: &AgentId) -> Result<Option<Agent>, StoreError>;

    /// Agents matching `query`, ordered by id, paginated by the query.
    async fn find(&self, query: &AgentQuery) -> Result<Vec<Agent>, StoreError>;

    /// Up to `limit` agents whose session expiry is at or before `now_ms`.
    async fn find_expired(&self, now_ms: u64, limit: usize) -> Result<Vec<Agent>, StoreError>;

    /// Insert a new document. Returns false if the id is already taken.
    async fn insert(&self, agent: &Agent) -> Result<bool, StoreError>;

    /// Apply `update` if the stored document still has `expected_index`.
    ///
    /// Returns the new document, or `None` when no row matched (a concurrent
    /// writer advanced the index, or the agent no longer exists).
    async fn update_if(
        &self,
        id: &AgentId,
        expected_index: u32,
        update: &AgentUpdate,
        now_ms: u64,
    ) -> Result<Option<Agent>, StoreError>;

    /// Physically remove a document. Returns false if it did not exist.
    async fn remove(&self, id: &AgentId) -> Result<bool, StoreError>;
}
