// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session start, update and termination.

use super::LeaseScheduler;
use crate::error::SchedulerError;
use crate::reconcile::plan_session_update;
use crate::request::{SessionStartRequest, SessionUpdateRequest};
use dv_adapters::SessionRecord;
use dv_core::{properties, Agent, AgentId, AgentStatus, Clock, LeaseId, LeaseOutcome, SessionId};
use dv_storage::{AgentStore, SessionStart};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

impl<S: AgentStore, C: Clock> LeaseScheduler<S, C> {
    /// Start a new session for `id`, replacing any current one.
    ///
    /// The replacement write counts as the prior session's termination: once
    /// it wins, the old record is finished and its leases finalized as failed.
    /// The status-change time carries over when the status is unchanged.
    pub async fn create_session(
        &self,
        id: &AgentId,
        enrollment_key: &str,
        request: &SessionStartRequest,
    ) -> Result<Agent, SchedulerError> {
        let mut agent = self.get_agent(id).await?;
        let properties = properties::normalize(request.properties.iter().cloned());
        loop {
            if agent.deleted || agent.enrollment_key != enrollment_key {
                return Err(SchedulerError::EnrollmentMismatch(id.clone()));
            }
            let now = self.now();
            let dynamic_pools = self.pool_cache.membership(&agent.explicit_pools, &properties).await?;
            let session_id = SessionId::new();
            let mut record = SessionRecord::new(session_id.clone(), id.clone(), now);
            record.properties = properties.clone();
            record.pools = agent.explicit_pools.iter().chain(&dynamic_pools).cloned().collect();
            self.sessions.create(record).await?;

            let start = SessionStart {
                session_id: session_id.clone(),
                expires_at_ms: now + self.config.session_lifetime.as_millis() as u64,
                status: request.status,
                properties: properties.clone(),
                resources: request.resources.clone(),
                dynamic_pools,
                last_status_change_ms: (agent.status == request.status).then_some(agent.last_status_change_ms),
            };
            if let Some(started) = self.agents.try_start_session(&agent, &start).await? {
                if let Some(prior) = &agent.session_id {
                    self.finish_session_record(prior, now).await;
                }
                for lease in &agent.leases {
                    self.finalize_lease(&agent, lease, LeaseOutcome::Failure, None).await;
                }
                return Ok(started);
            }

            if let Err(e) = self.sessions.delete(&session_id).await {
                tracing::warn!(session = %session_id, error = %e, "failed to delete abandoned session record");
            }
            tokio::task::yield_now().await;
            agent = self.refetch(id).await?;
        }
    }

    /// Reconcile an agent's report, then long-poll for new work.
    ///
    /// A `Stopping` agent whose session is already gone gets its current
    /// document back instead of an error, and is terminated once it has no
    /// leases left.
    pub async fn update_session(
        &self,
        id: &AgentId,
        request: &SessionUpdateRequest,
        cancel: &CancellationToken,
    ) -> Result<Agent, SchedulerError> {
        let mut agent = self.get_agent(id).await?;
        let updated = loop {
            if agent.session_id.as_ref() != Some(&request.session_id) {
                if request.status == AgentStatus::Stopping {
                    return Ok(agent);
                }
                return Err(SchedulerError::InvalidSession { agent: id.clone(), reason: "session mismatch".into() });
            }
            let now = self.now();
            if !agent.is_session_valid(now) {
                return Err(SchedulerError::InvalidSession { agent: id.clone(), reason: "session expired".into() });
            }

            let mut plan =
                plan_session_update(&agent, request, now, self.config.renewal_window, self.config.session_lifetime);
            if let Some(properties) = plan.changes.properties.as_ref().filter(|p| **p != agent.properties) {
                plan.changes.dynamic_pools = Some(self.pool_cache.membership(&agent.explicit_pools, properties).await?);
            }
            if let Some(updated) = self.agents.try_update_session(&agent, &plan.changes).await? {
                for finished in &plan.finished {
                    self.finalize_lease(&updated, &finished.lease, finished.outcome, finished.output.as_deref()).await;
                }
                break updated;
            }
            tokio::task::yield_now().await;
            agent = self.refetch(id).await?;
        };

        if updated.status == AgentStatus::Stopping && updated.leases.is_empty() {
            let session_id = request.session_id.clone();
            return self
                .terminate_where(updated, false, move |a| a.session_id.as_ref() == Some(&session_id))
                .await;
        }
        let known: HashSet<LeaseId> = request.leases.iter().map(|r| r.id.clone()).collect();
        self.wait_for_lease(updated, &known, cancel).await
    }

    /// End `agent`'s session, finalizing its outstanding leases as failed.
    pub async fn terminate_session(&self, agent: Agent) -> Result<Agent, SchedulerError> {
        self.terminate_where(agent, false, |_| true).await
    }

    /// Terminate while `still_applies` holds for the freshest snapshot.
    /// Lost writes re-read and re-check; the winning write's prior
    /// snapshot decides which leases get finalized.
    pub(super) async fn terminate_where<F>(
        &self,
        mut agent: Agent,
        preserve_status_change: bool,
        still_applies: F,
    ) -> Result<Agent, SchedulerError>
    where
        F: Fn(&Agent) -> bool + Send,
    {
        loop {
            if !still_applies(&agent) {
                return Ok(agent);
            }
            match self.agents.try_terminate_session(&agent, preserve_status_change).await? {
                Some(done) if done.update_index == agent.update_index => return Ok(done),
                Some(done) => {
                    let now = self.now();
                    if let Some(session_id) = &agent.session_id {
                        self.finish_session_record(session_id, now).await;
                    }
                    for lease in &agent.leases {
                        self.finalize_lease(&agent, lease, LeaseOutcome::Failure, None).await;
                    }
                    self.agents.publish_update(&agent.id);
                    return Ok(done);
                }
                None => {
                    tokio::task::yield_now().await;
                    agent = self.refetch(&agent.id).await?;
                }
            }
        }
    }

    async fn finish_session_record(&self, session_id: &SessionId, now_ms: u64) {
        if let Err(e) = self.sessions.finish(session_id, now_ms).await {
            tracing::warn!(session = %session_id, error = %e, "failed to finish session record");
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
