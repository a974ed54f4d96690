// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Long-poll lease assignment.

use super::LeaseScheduler;
use crate::error::SchedulerError;
use dv_adapters::{LeaseRecord, ProviderError, WorkProvider};
use dv_core::{Agent, AgentStatus, Clock, Lease, LeaseId};
use dv_storage::AgentStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

type Offer = (Arc<dyn WorkProvider>, Result<Option<Lease>, ProviderError>);

/// How one round of asking providers ended.
enum Round {
    Offered(Arc<dyn WorkProvider>, Lease),
    /// An update notification arrived; re-read and go again
    Woken,
    TimedOut,
    Cancelled,
    Shutdown,
}

impl Round {
    fn label(&self) -> &'static str {
        match self {
            Round::Offered(..) => "offered",
            Round::Woken => "woken",
            Round::TimedOut => "timed out",
            Round::Cancelled => "cancelled",
            Round::Shutdown => "shutdown",
        }
    }
}

impl<S: AgentStore, C: Clock> LeaseScheduler<S, C> {
    /// Wait until some provider offers `agent` a lease, the agent changes,
    /// or the poll budget runs out.
    ///
    /// Returns at once if the session is invalid or the agent holds a lease
    /// the caller has not seen (listed in `known`). The budget ends
    /// `expiry_margin` before the session would expire, so the caller always
    /// gets a chance to renew.
    pub async fn wait_for_lease(
        &self,
        mut agent: Agent,
        known: &HashSet<LeaseId>,
        cancel: &CancellationToken,
    ) -> Result<Agent, SchedulerError> {
        loop {
            let now = self.now();
            if !agent.is_session_valid(now) || agent.leases.iter().any(|l| !known.contains(&l.id)) {
                return Ok(agent);
            }
            let budget = agent
                .session_expires_at_ms
                .and_then(|expires| self.agents.clock().until(self.config.wait_deadline_ms(expires)));
            let Some(budget) = budget else {
                tracing::debug!(agent = %agent.id, "no long-poll budget left");
                return Ok(agent);
            };

            let round = self.ask_providers(&agent, budget, cancel).await;
            tracing::debug!(agent = %agent.id, round = round.label(), "long-poll round ended");
            match round {
                Round::Offered(provider, lease) => {
                    if !agent.admits(&lease) {
                        tracing::info!(agent = %agent.id, lease = %lease.id, provider = provider.name(), "offered lease does not fit");
                        self.release_lease(&provider, &agent, &lease).await;
                        return self.refetch(&agent.id).await;
                    }
                    match self.agents.try_add_lease(&agent, &lease).await {
                        Ok(Some(updated)) => {
                            self.start_lease(&provider, &updated, &lease).await;
                            return Ok(updated);
                        }
                        Ok(None) => self.release_lease(&provider, &agent, &lease).await,
                        Err(e) => {
                            self.release_lease(&provider, &agent, &lease).await;
                            return Err(e.into());
                        }
                    }
                }
                Round::Woken => {}
                Round::TimedOut | Round::Cancelled | Round::Shutdown => return self.refetch(&agent.id).await,
            }
            agent = self.refetch(&agent.id).await?;
        }
    }

    /// Race every eligible provider for one offer. The waiter registration
    /// lives exactly as long as this call.
    async fn ask_providers(&self, agent: &Agent, budget: Duration, cancel: &CancellationToken) -> Round {
        let waiter = self.waiters.register(&agent.id);
        let token = waiter.token().clone();

        let in_downtime = self.downtime.is_active().await;
        let providers = match agent.status {
            AgentStatus::Stopping => Vec::new(),
            _ => self.providers.eligible(agent, in_downtime),
        };
        let mut offers: JoinSet<Offer> = JoinSet::new();
        for provider in providers {
            let (agent, token) = (agent.clone(), token.clone());
            offers.spawn(async move {
                let offered = provider.offer_lease(&agent, token).await;
                (provider, offered)
            });
        }

        let deadline = tokio::time::sleep(budget);
        tokio::pin!(deadline);
        let round = loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break Round::Shutdown,
                _ = cancel.cancelled() => break Round::Cancelled,
                Some(joined) = offers.join_next(), if !offers.is_empty() => match joined {
                    Ok((provider, Ok(Some(lease)))) => break Round::Offered(provider, lease),
                    Ok((_, Ok(None))) => {}
                    Ok((provider, Err(e))) => {
                        tracing::warn!(agent = %agent.id, provider = provider.name(), error = %e, "work provider failed");
                    }
                    Err(e) => tracing::warn!(agent = %agent.id, error = %e, "work provider task failed"),
                },
                _ = token.cancelled() => break Round::Woken,
                _ = &mut deadline => break Round::TimedOut,
            }
        };
        token.cancel();
        drop(waiter);

        if !offers.is_empty() {
            tokio::spawn(release_late_offers(agent.clone(), offers));
        }
        round
    }

    /// The lease is attached: tell its provider, open its audit record,
    /// and wake anything watching the agent.
    async fn start_lease(&self, provider: &Arc<dyn WorkProvider>, agent: &Agent, lease: &Lease) {
        tracing::info!(agent = %agent.id, lease = %lease.id, name = %lease.name, provider = provider.name(), "lease assigned");
        if let Err(e) = provider.on_lease_started(agent, &lease.id, &lease.payload).await {
            tracing::warn!(lease = %lease.id, provider = provider.name(), error = %e, "provider failed to start lease");
        }
        if let Err(e) = self.lease_log.add(LeaseRecord::started(agent, lease)).await {
            tracing::warn!(lease = %lease.id, error = %e, "failed to record lease start");
        }
        self.agents.publish_update(&agent.id);
    }
}

/// Drain offers that lost the race; any lease that still turns up goes back
/// to its provider.
async fn release_late_offers(agent: Agent, mut offers: JoinSet<Offer>) {
    while let Some(joined) = offers.join_next().await {
        let Ok((provider, Ok(Some(lease)))) = joined else {
            continue;
        };
        tracing::info!(agent = %agent.id, lease = %lease.id, provider = provider.name(), "releasing late lease");
        if let Err(e) = provider.cancel_lease(&agent, &lease.id, &lease.payload).await {
            tracing::warn!(lease = %lease.id, provider = provider.name(), error = %e, "failed to release lease");
        }
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
