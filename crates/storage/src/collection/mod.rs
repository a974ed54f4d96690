// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed operations over the agent store.
//!
//! Every `try_*` method takes the caller's snapshot of an agent and performs
//! one conditional write against that snapshot's update index. `Ok(None)`
//! means the snapshot was stale; re-read and recompute (see
//! [`crate::update_with_retry`]). Side indexes are only touched after the
//! write that justifies them has won.

mod session;

pub use session::{SessionChanges, SessionStart};

use crate::channel::{Subscription, UpdateChannel};
use crate::counters::PayloadCounters;
use crate::error::StoreError;
use crate::lease_index::ActiveLeaseIndex;
use crate::query::AgentQuery;
use crate::store::AgentStore;
use crate::update::AgentUpdate;
use dv_core::{Agent, AgentId, AgentStatus, Clock, Lease, LeaseState, PoolId};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_LEASE_INDEX_TTL: Duration = Duration::from_secs(60 * 60);

/// Operator-controlled fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct AgentSettings {
    pub enabled: Option<bool>,
    pub comment: Option<Option<String>>,
    pub explicit_pools: Option<Vec<PoolId>>,
    pub request_conform: Option<bool>,
    pub request_full_conform: Option<bool>,
    pub request_restart: Option<bool>,
    pub request_shutdown: Option<bool>,
    pub request_force_restart: Option<bool>,
    pub shutdown_reason: Option<Option<String>>,
}

impl AgentSettings {
    /// The delta these settings describe.
    pub fn to_update(&self) -> AgentUpdate {
        AgentUpdate {
            enabled: self.enabled,
            comment: self.comment.clone(),
            explicit_pools: self.explicit_pools.clone(),
            request_conform: self.request_conform,
            request_full_conform: self.request_full_conform,
            request_restart: self.request_restart,
            request_shutdown: self.request_shutdown,
            request_force_restart: self.request_force_restart,
            last_shutdown_reason: self.shutdown_reason.clone(),
            ..Default::default()
        }
    }
}

pub struct AgentCollection<S: AgentStore, C: Clock> {
    store: Arc<S>,
    clock: C,
    lease_index: ActiveLeaseIndex<C>,
    channel: UpdateChannel,
    counters: PayloadCounters,
}

impl<S: AgentStore, C: Clock> AgentCollection<S, C> {
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self {
            lease_index: ActiveLeaseIndex::new(clock.clone(), DEFAULT_LEASE_INDEX_TTL),
            store,
            clock,
            channel: UpdateChannel::default(),
            counters: PayloadCounters::default(),
        }
    }

    pub fn with_lease_index_ttl(mut self, ttl: Duration) -> Self {
        self.lease_index = ActiveLeaseIndex::new(self.clock.clone(), ttl);
        self
    }

    pub fn with_channel(mut self, channel: UpdateChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_counters(mut self, counters: PayloadCounters) -> Self {
        self.counters = counters;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn lease_index(&self) -> &ActiveLeaseIndex<C> {
        &self.lease_index
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub async fn get(&self, id: &AgentId) -> Result<Option<Agent>, StoreError> {
        self.store.get(id).await
    }

    pub async fn find(&self, query: &AgentQuery) -> Result<Vec<Agent>, StoreError> {
        self.store.find(query).await
    }

    pub async fn find_expired(&self, limit: usize) -> Result<Vec<Agent>, StoreError> {
        self.store.find_expired(self.clock.epoch_ms(), limit).await
    }

    // ── Raw conditional write ───────────────────────────────────────────

    /// Apply `update` against `agent`'s index. Fields equal to the snapshot
    /// are dropped first; an update with nothing left is not written and
    /// returns the snapshot unchanged.
    pub async fn try_update(&self, agent: &Agent, update: AgentUpdate) -> Result<Option<Agent>, StoreError> {
        let update = update.without_unchanged(agent);
        if update.is_empty() {
            return Ok(Some(agent.clone()));
        }
        let written = self
            .store
            .update_if(&agent.id, agent.update_index, &update, self.clock.epoch_ms())
            .await?;
        if written.is_none() {
            tracing::debug!(agent = %agent.id, index = agent.update_index, "conditional write lost");
        }
        Ok(written)
    }

    // ── Registration ────────────────────────────────────────────────────

    /// Return the agent registered under `id` with `enrollment_key`,
    /// inserting or resetting the record as needed. Retries on conflict.
    pub async fn create_or_reset(
        &self,
        id: &AgentId,
        enrollment_key: &str,
        ephemeral: bool,
    ) -> Result<Agent, StoreError> {
        loop {
            match self.store.get(id).await? {
                None => {
                    let agent = Agent::new(id.clone(), enrollment_key, ephemeral, self.clock.epoch_ms());
                    if self.store.insert(&agent).await? {
                        tracing::info!(agent = %id, ephemeral, "agent registered");
                        return Ok(agent);
                    }
                }
                Some(existing) if !existing.deleted && existing.enrollment_key == enrollment_key => {
                    return Ok(existing);
                }
                Some(existing) => {
                    if let Some(agent) = self.try_reset(&existing, enrollment_key, ephemeral).await? {
                        tracing::info!(agent = %id, ephemeral, "agent re-enrolled");
                        return Ok(agent);
                    }
                }
            }
            tokio::task::yield_now().await;
        }
    }

    /// Rebind `agent` to a new enrollment: undelete it, drop any session.
    pub async fn try_reset(
        &self,
        agent: &Agent,
        enrollment_key: &str,
        ephemeral: bool,
    ) -> Result<Option<Agent>, StoreError> {
        let mut update = AgentUpdate {
            enrollment_key: Some(enrollment_key.to_string()),
            ephemeral: Some(ephemeral),
            deleted: Some(false),
            session_id: Some(None),
            session_expires_at_ms: Some(None),
            leases: Some(Vec::new()),
            ..Default::default()
        };
        update.set_status(agent, AgentStatus::Stopped, self.clock.epoch_ms());
        let written = self.try_update(agent, update).await?;
        if written.is_some() {
            self.forget_leases(agent);
        }
        Ok(written)
    }

    /// Mark deleted and blank the enrollment key so the agent must re-enroll.
    pub async fn try_soft_delete(&self, agent: &Agent) -> Result<Option<Agent>, StoreError> {
        let update = AgentUpdate {
            deleted: Some(true),
            enrollment_key: Some(String::new()),
            ..Default::default()
        };
        self.try_update(agent, update).await
    }

    /// Soft-delete with retry. Returns the deleted document, or `None` if the
    /// agent does not exist.
    pub async fn delete(&self, id: &AgentId) -> Result<Option<Agent>, StoreError> {
        let Some(agent) = self.store.get(id).await? else {
            return Ok(None);
        };
        let deleted = crate::retry::update_with_retry(self, agent, |current| {
            (!current.deleted).then(|| AgentUpdate {
                deleted: Some(true),
                enrollment_key: Some(String::new()),
                ..Default::default()
            })
        })
        .await?;
        tracing::info!(agent = %id, "agent deleted");
        Ok(Some(deleted))
    }

    /// Physically remove the document.
    pub async fn force_delete(&self, id: &AgentId) -> Result<bool, StoreError> {
        let removed = self.store.remove(id).await?;
        if removed {
            self.lease_index.remove_agent(id);
            tracing::info!(agent = %id, "agent removed");
        }
        Ok(removed)
    }

    // ── Settings ────────────────────────────────────────────────────────

    pub async fn try_update_settings(
        &self,
        agent: &Agent,
        settings: &AgentSettings,
    ) -> Result<Option<Agent>, StoreError> {
        self.try_update(agent, settings.to_update()).await
    }

    // ── Leases ──────────────────────────────────────────────────────────

    /// Append `lease`, bumping the payload's diagnostic counters in the same
    /// write. Capacity checks are the caller's job.
    pub async fn try_add_lease(&self, agent: &Agent, lease: &Lease) -> Result<Option<Agent>, StoreError> {
        let now = self.clock.epoch_ms();
        let mut leases = agent.leases.clone();
        leases.push(lease.clone());
        let mut update = AgentUpdate { leases: Some(leases), ..Default::default() };
        self.counters.apply(agent, &lease.payload, now, &mut update);

        let written = self.try_update(agent, update).await?;
        if written.is_some() {
            self.lease_index.add(&agent.id, lease);
        }
        Ok(written)
    }

    /// Flag the lease at `position` as cancelled so the agent abandons it.
    /// Already-cancelled or out-of-range positions write nothing.
    pub async fn try_cancel_lease(&self, agent: &Agent, position: usize) -> Result<Option<Agent>, StoreError> {
        let Some(target) = agent.leases.get(position) else {
            return Ok(Some(agent.clone()));
        };
        if target.state == LeaseState::Cancelled {
            return Ok(Some(agent.clone()));
        }
        let lease_id = target.id.clone();
        let mut leases = agent.leases.clone();
        leases[position].state = LeaseState::Cancelled;

        let written = self.try_update(agent, AgentUpdate { leases: Some(leases), ..Default::default() }).await?;
        if written.is_some() {
            self.lease_index.remove(&lease_id);
        }
        Ok(written)
    }

    /// Rebuild the lease index from every stored document.
    pub async fn rebuild_lease_index(&self) -> Result<usize, StoreError> {
        let agents = self.store.find(&AgentQuery::everything()).await?;
        self.lease_index.rebuild(&agents);
        Ok(self.lease_index.len())
    }

    fn forget_leases(&self, agent: &Agent) {
        for lease in &agent.leases {
            self.lease_index.remove(&lease.id);
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    pub fn publish_update(&self, id: &AgentId) {
        self.channel.publish(id);
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(AgentId) + Send + Sync + 'static,
    {
        self.channel.subscribe(callback)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
