// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle writes.

use super::AgentCollection;
use crate::error::StoreError;
use crate::store::AgentStore;
use crate::update::AgentUpdate;
use dv_core::{Agent, AgentStatus, Clock, Lease, PoolId, ResourceMap, SessionId};

/// Fields written when a session starts.
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub session_id: SessionId,
    pub expires_at_ms: u64,
    pub status: AgentStatus,
    pub properties: Vec<String>,
    pub resources: ResourceMap,
    pub dynamic_pools: Vec<PoolId>,
    /// Explicit status-change time, e.g. carried over from a session that
    /// was just terminated. `None` stamps now when the status changes.
    pub last_status_change_ms: Option<u64>,
}

/// Fields a session update may change. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct SessionChanges {
    pub status: Option<AgentStatus>,
    pub expires_at_ms: Option<u64>,
    pub properties: Option<Vec<String>>,
    pub resources: Option<ResourceMap>,
    pub dynamic_pools: Option<Vec<PoolId>>,
    pub leases: Option<Vec<Lease>>,
}

impl<S: AgentStore, C: Clock> AgentCollection<S, C> {
    /// Begin a new session: fresh id and expiry, empty lease list, transient
    /// restart/shutdown requests cleared.
    pub async fn try_start_session(&self, agent: &Agent, start: &SessionStart) -> Result<Option<Agent>, StoreError> {
        let mut update = AgentUpdate {
            session_id: Some(Some(start.session_id.clone())),
            session_expires_at_ms: Some(Some(start.expires_at_ms)),
            properties: Some(start.properties.clone()),
            resources: Some(start.resources.clone()),
            dynamic_pools: Some(start.dynamic_pools.clone()),
            leases: Some(Vec::new()),
            request_restart: Some(false),
            request_shutdown: Some(false),
            request_force_restart: Some(false),
            ..Default::default()
        };
        update.set_status(agent, start.status, self.clock.epoch_ms());
        if let Some(at) = start.last_status_change_ms {
            update.last_status_change_ms = Some(at);
        }

        let written = self.try_update(agent, update).await?;
        if written.is_some() {
            self.forget_leases(agent);
            tracing::info!(agent = %agent.id, session = %start.session_id, "session started");
        }
        Ok(written)
    }

    /// Write whichever of `changes` differ from `agent`. Index entries of
    /// leases that are no longer listed are dropped once the write wins.
    pub async fn try_update_session(
        &self,
        agent: &Agent,
        changes: &SessionChanges,
    ) -> Result<Option<Agent>, StoreError> {
        let mut update = AgentUpdate {
            session_expires_at_ms: changes.expires_at_ms.map(Some),
            properties: changes.properties.clone(),
            resources: changes.resources.clone(),
            dynamic_pools: changes.dynamic_pools.clone(),
            leases: changes.leases.clone(),
            ..Default::default()
        };
        if let Some(status) = changes.status {
            update.set_status(agent, status, self.clock.epoch_ms());
        }

        let written = self.try_update(agent, update).await?;
        if let (Some(_), Some(kept)) = (&written, &changes.leases) {
            for lease in &agent.leases {
                if !kept.iter().any(|l| l.id == lease.id) {
                    self.lease_index.remove(&lease.id);
                }
            }
        }
        Ok(written)
    }

    /// End the current session. Leaves the agent `Stopped` with no session
    /// and no leases; an ephemeral agent is also marked deleted. An agent
    /// with neither a session nor leases is returned without a write.
    pub async fn try_terminate_session(
        &self,
        agent: &Agent,
        preserve_status_change: bool,
    ) -> Result<Option<Agent>, StoreError> {
        if !agent.has_session() && agent.leases.is_empty() {
            return Ok(Some(agent.clone()));
        }
        let mut update = AgentUpdate {
            session_id: Some(None),
            session_expires_at_ms: Some(None),
            leases: Some(Vec::new()),
            status: Some(AgentStatus::Stopped),
            ..Default::default()
        };
        if agent.status != AgentStatus::Stopped && !preserve_status_change {
            update.last_status_change_ms = Some(self.clock.epoch_ms());
        }
        if agent.ephemeral {
            update.deleted = Some(true);
        }

        let written = self.try_update(agent, update).await?;
        if written.is_some() {
            self.forget_leases(agent);
            tracing::info!(
                agent = %agent.id,
                leases = agent.leases.len(),
                ephemeral = agent.ephemeral,
                "session terminated"
            );
        }
        Ok(written)
    }
}
