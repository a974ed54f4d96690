// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lease scheduler.
//!
//! Every mutation is a conditional write against the caller's snapshot of
//! the agent; a lost write re-reads and recomputes. Side effects that live
//! outside the agent document (lease log, session records, provider
//! callbacks, the active-lease index) happen only after the write that
//! justifies them has won.

mod maintenance;
mod session;
mod wait;

pub use maintenance::MaintenanceReport;

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::metrics::AgentMetrics;
use crate::pools::PoolCache;
use crate::waiters::WaiterTable;
use dv_adapters::{DowntimeSource, LeaseLog, PoolSource, ProviderRegistry, SessionStore, WorkProvider};
use dv_core::{Agent, AgentId, Clock, Lease, LeaseId, LeaseOutcome, LeaseState};
use dv_storage::{AgentCollection, AgentSettings, AgentStore, Subscription};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Collaborators the scheduler is built from.
pub struct SchedulerDeps<S: AgentStore, C: Clock> {
    pub agents: Arc<AgentCollection<S, C>>,
    pub sessions: Arc<dyn SessionStore>,
    pub lease_log: Arc<dyn LeaseLog>,
    pub providers: ProviderRegistry,
    pub pools: Arc<dyn PoolSource>,
    pub downtime: Arc<dyn DowntimeSource>,
}

pub struct LeaseScheduler<S: AgentStore, C: Clock> {
    agents: Arc<AgentCollection<S, C>>,
    sessions: Arc<dyn SessionStore>,
    lease_log: Arc<dyn LeaseLog>,
    providers: ProviderRegistry,
    downtime: Arc<dyn DowntimeSource>,
    pool_cache: PoolCache<C>,
    config: SchedulerConfig,
    waiters: Arc<WaiterTable>,
    shutdown: CancellationToken,
    metrics: Mutex<AgentMetrics>,
    _subscription: Subscription,
}

impl<S: AgentStore, C: Clock> LeaseScheduler<S, C> {
    /// Build the scheduler and subscribe it to agent update notifications.
    /// Must be called within a Tokio runtime.
    pub fn new(deps: SchedulerDeps<S, C>, config: SchedulerConfig) -> Self {
        let waiters = Arc::new(WaiterTable::new());
        let wake = Arc::clone(&waiters);
        let subscription = deps.agents.subscribe(move |id: AgentId| {
            if wake.wake(&id) {
                tracing::trace!(agent = %id, "long-poll woken");
            }
        });
        let clock = deps.agents.clock().clone();
        Self {
            pool_cache: PoolCache::new(deps.pools, clock, config.pool_cache_ttl),
            agents: deps.agents,
            sessions: deps.sessions,
            lease_log: deps.lease_log,
            providers: deps.providers,
            downtime: deps.downtime,
            config,
            waiters,
            shutdown: CancellationToken::new(),
            metrics: Mutex::new(AgentMetrics::default()),
            _subscription: subscription,
        }
    }

    pub fn agents(&self) -> &Arc<AgentCollection<S, C>> {
        &self.agents
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn pool_cache(&self) -> &PoolCache<C> {
        &self.pool_cache
    }

    pub fn waiters(&self) -> &Arc<WaiterTable> {
        &self.waiters
    }

    /// Metrics from the most recent maintenance pass.
    pub fn metrics(&self) -> AgentMetrics {
        self.metrics.lock().clone()
    }

    /// Ends every in-flight long-poll and the maintenance loop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    fn now(&self) -> u64 {
        self.agents.clock().epoch_ms()
    }

    pub async fn get_agent(&self, id: &AgentId) -> Result<Agent, SchedulerError> {
        self.agents.get(id).await?.ok_or_else(|| SchedulerError::AgentNotFound(id.clone()))
    }

    async fn refetch(&self, id: &AgentId) -> Result<Agent, SchedulerError> {
        self.agents.get(id).await?.ok_or_else(|| SchedulerError::AgentVanished(id.clone()))
    }

    // ── Registration and settings ───────────────────────────────────────

    /// Register `id` under `enrollment_key`. Re-registering with a new key,
    /// or after deletion, ends whatever session the old enrollment left.
    pub async fn register_agent(
        &self,
        id: &AgentId,
        enrollment_key: &str,
        ephemeral: bool,
    ) -> Result<Agent, SchedulerError> {
        if let Some(existing) = self.agents.get(id).await? {
            let stale = |a: &Agent| a.deleted || a.enrollment_key != enrollment_key;
            if stale(&existing) {
                self.terminate_where(existing, false, stale).await?;
            }
        }
        Ok(self.agents.create_or_reset(id, enrollment_key, ephemeral).await?)
    }

    /// Apply operator settings, retrying until they land. Dynamic pools are
    /// recomputed from each snapshot's properties when explicit pools change.
    pub async fn update_settings(&self, id: &AgentId, settings: &AgentSettings) -> Result<Agent, SchedulerError> {
        let mut agent = self.get_agent(id).await?;
        let updated = loop {
            let mut update = settings.to_update();
            if let Some(explicit) = &settings.explicit_pools {
                update.dynamic_pools = Some(self.pool_cache.membership(explicit, &agent.properties).await?);
            }
            if let Some(updated) = self.agents.try_update(&agent, update).await? {
                break updated;
            }
            tokio::task::yield_now().await;
            agent = self.refetch(id).await?;
        };
        self.agents.publish_update(id);
        Ok(updated)
    }

    /// End any session, then soft-delete. Returns `None` for an unknown agent.
    pub async fn delete_agent(&self, id: &AgentId) -> Result<Option<Agent>, SchedulerError> {
        let Some(agent) = self.agents.get(id).await? else {
            return Ok(None);
        };
        self.terminate_session(agent).await?;
        let deleted = self.agents.delete(id).await?;
        self.agents.publish_update(id);
        Ok(deleted)
    }

    // ── Lease cancellation ──────────────────────────────────────────────

    /// Ask the agent holding `lease_id` to abandon it. The lease stays on
    /// the agent, flagged cancelled, until the agent confirms.
    pub async fn cancel_lease(&self, lease_id: &LeaseId) -> Result<Agent, SchedulerError> {
        let mut rebuilt = false;
        loop {
            let Some((agent, position)) = self.locate_lease(lease_id).await? else {
                if rebuilt {
                    return Err(SchedulerError::LeaseNotFound(lease_id.clone()));
                }
                let indexed = self.agents.rebuild_lease_index().await?;
                tracing::debug!(lease = %lease_id, indexed, "lease index rebuilt");
                rebuilt = true;
                continue;
            };
            let Some(lease) = agent.leases.get(position).cloned() else {
                continue;
            };
            if lease.state == LeaseState::Cancelled {
                return Ok(agent);
            }
            if let Some(updated) = self.agents.try_cancel_lease(&agent, position).await? {
                tracing::info!(agent = %agent.id, lease = %lease_id, "lease cancelled");
                if let Some(provider) = self.provider_for(&lease) {
                    if let Err(e) = provider.cancel_lease(&updated, lease_id, &lease.payload).await {
                        tracing::warn!(lease = %lease_id, provider = provider.name(), error = %e, "provider failed to cancel lease");
                    }
                }
                self.agents.publish_update(&agent.id);
                return Ok(updated);
            }
            tokio::task::yield_now().await;
        }
    }

    /// Owning agent and position of `lease_id`, per the index hint. A hint
    /// pointing at an agent that no longer lists the lease counts as a miss.
    async fn locate_lease(&self, lease_id: &LeaseId) -> Result<Option<(Agent, usize)>, SchedulerError> {
        let Some(agent_id) = self.agents.lease_index().agent_for(lease_id) else {
            return Ok(None);
        };
        let Some(agent) = self.agents.get(&agent_id).await? else {
            return Ok(None);
        };
        let position = agent.find_lease(lease_id.as_str()).map(|(position, _)| position);
        Ok(position.map(|position| (agent, position)))
    }

    // ── Lease lifecycle plumbing ────────────────────────────────────────

    fn provider_for(&self, lease: &Lease) -> Option<&Arc<dyn WorkProvider>> {
        self.providers.get(&lease.payload.type_tag)
    }

    /// Record the outcome of a lease that has left `agent` and tell its
    /// provider. Neither step can fail the caller.
    async fn finalize_lease(&self, agent: &Agent, lease: &Lease, outcome: LeaseOutcome, output: Option<&[u8]>) {
        match self.lease_log.finish(&lease.id, outcome, self.now(), output.map(<[u8]>::to_vec)).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(lease = %lease.id, "lease already finalized"),
            Err(e) => tracing::warn!(lease = %lease.id, error = %e, "failed to record lease outcome"),
        }
        match self.provider_for(lease) {
            Some(provider) => {
                if let Err(e) = provider.on_lease_finished(agent, &lease.id, &lease.payload, outcome, output).await {
                    tracing::warn!(lease = %lease.id, provider = provider.name(), error = %e, "provider failed to finish lease");
                }
            }
            None => tracing::debug!(lease = %lease.id, payload_type = %lease.payload.type_tag, "no provider for finished lease"),
        }
        tracing::info!(agent = %agent.id, lease = %lease.id, %outcome, "lease finished");
    }

    /// Hand an unattached lease back to its provider.
    async fn release_lease(&self, provider: &Arc<dyn WorkProvider>, agent: &Agent, lease: &Lease) {
        tracing::debug!(agent = %agent.id, lease = %lease.id, provider = provider.name(), "releasing lease");
        if let Err(e) = provider.cancel_lease(agent, &lease.id, &lease.payload).await {
            tracing::warn!(lease = %lease.id, provider = provider.name(), error = %e, "failed to release lease");
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
