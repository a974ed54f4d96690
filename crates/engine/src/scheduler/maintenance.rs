// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic sweeps: expired sessions, stale ephemeral agents, fleet metrics.

use super::LeaseScheduler;
use crate::error::SchedulerError;
use crate::metrics::AgentMetrics;
use dv_core::{Agent, AgentStatus, Clock};
use dv_storage::{AgentQuery, AgentStore, DeletedMode};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// What one maintenance pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub expired_terminated: usize,
    pub ephemeral_removed: usize,
    pub metrics: AgentMetrics,
}

fn still_expired(agent: &Agent, now_ms: u64) -> bool {
    agent.session_expires_at_ms.is_some_and(|at| at <= now_ms)
}

impl<S: AgentStore, C: Clock> LeaseScheduler<S, C> {
    /// Run one maintenance pass.
    pub async fn tick(&self) -> Result<MaintenanceReport, SchedulerError> {
        let expired_terminated = self.sweep_expired().await?;
        let ephemeral_removed = self.sweep_ephemeral().await?;
        let agents = self.agents.find(&AgentQuery::default()).await?;
        let metrics = AgentMetrics::collect(&agents);
        *self.metrics.lock() = metrics.clone();

        tracing::info!(
            agents = metrics.total,
            with_session = metrics.with_session,
            leases = metrics.active_leases,
            expired_terminated,
            ephemeral_removed,
            "maintenance pass"
        );
        Ok(MaintenanceReport { expired_terminated, ephemeral_removed, metrics })
    }

    /// Maintenance every `maintenance_interval` until shutdown.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.config.maintenance_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::warn!(error = %e, "maintenance pass failed");
                    }
                }
            }
        }
        tracing::info!("maintenance stopped");
    }

    pub fn spawn_maintenance(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run().await })
    }

    /// Terminate every session whose expiry has passed, a batch at a time.
    /// Stops once a batch comes back short or nothing in it could be ended.
    async fn sweep_expired(&self) -> Result<usize, SchedulerError> {
        let batch_size = self.config.expired_batch_size.max(1);
        let mut terminated = 0;
        loop {
            let batch = self.agents.find_expired(batch_size).await?;
            let full = batch.len() >= batch_size;
            let mut progress = 0;
            for agent in batch {
                let id = agent.id.clone();
                let now = self.now();
                match self.terminate_where(agent, false, move |a| still_expired(a, now)).await {
                    Ok(done) if !still_expired(&done, now) => progress += 1,
                    Ok(_) => {}
                    Err(SchedulerError::AgentVanished(_)) => progress += 1,
                    Err(e) => tracing::warn!(agent = %id, error = %e, "failed to terminate expired session"),
                }
            }
            terminated += progress;
            if !full || progress == 0 {
                return Ok(terminated);
            }
        }
    }

    /// Hard-delete deleted ephemeral agents that have sat stopped for the
    /// whole grace period.
    async fn sweep_ephemeral(&self) -> Result<usize, SchedulerError> {
        let cutoff = self.now().saturating_sub(self.config.ephemeral_grace.as_millis() as u64);
        let query = AgentQuery {
            deleted: DeletedMode::Only,
            ephemeral: Some(true),
            status: Some(AgentStatus::Stopped),
            status_changed_before_ms: Some(cutoff),
            ..Default::default()
        };
        let mut removed = 0;
        for agent in self.agents.find(&query).await? {
            if self.agents.force_delete(&agent.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
