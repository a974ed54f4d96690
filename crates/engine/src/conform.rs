// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in provider that turns an operator's conform request into a lease.

use async_trait::async_trait;
use dv_adapters::{ProviderError, ProviderPolicy, WorkProvider};
use dv_core::{Agent, AgentStatus, Clock, ConformPayload, Lease, LeaseId, LeaseOutcome, LeasePayload};
use dv_storage::{update_with_retry, AgentCollection, AgentStore, AgentUpdate};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const NAME: &str = "conform";

/// Offers one exclusive conform lease to an idle `Ok` agent whose
/// `request_conform` flag is set, and clears the flag once a conform
/// succeeds. A failed or cancelled conform leaves the flag for a retry.
///
/// Disabled agents still qualify. A busy agent does not: its long-polls
/// cancel every lease it holds.
pub struct ConformProvider<S: AgentStore, C: Clock> {
    agents: Arc<AgentCollection<S, C>>,
}

impl<S: AgentStore, C: Clock> ConformProvider<S, C> {
    pub fn new(agents: Arc<AgentCollection<S, C>>) -> Self {
        Self { agents }
    }

    fn failed(message: impl ToString) -> ProviderError {
        ProviderError::Failed { provider: NAME.to_string(), message: message.to_string() }
    }
}

#[async_trait]
impl<S: AgentStore, C: Clock> WorkProvider for ConformProvider<S, C> {
    fn name(&self) -> &str {
        NAME
    }

    fn payload_type(&self) -> &str {
        ConformPayload::TYPE_TAG
    }

    fn policy(&self) -> ProviderPolicy {
        ProviderPolicy { allow_when_disabled: true, ..Default::default() }
    }

    async fn offer_lease(&self, agent: &Agent, _cancel: CancellationToken) -> Result<Option<Lease>, ProviderError> {
        let idle = agent.leases.is_empty() && agent.status == AgentStatus::Ok;
        if !agent.request_conform || !idle {
            return Ok(None);
        }
        let payload = ConformPayload { full: agent.request_full_conform }.encode().map_err(Self::failed)?;
        let lease = Lease::new("Conform", payload, self.agents.clock().epoch_ms()).with_exclusive(true);
        tracing::info!(agent = %agent.id, lease = %lease.id, full = agent.request_full_conform, "offering conform");
        Ok(Some(lease))
    }

    async fn on_lease_started(
        &self,
        _agent: &Agent,
        _lease_id: &LeaseId,
        _payload: &LeasePayload,
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn on_lease_finished(
        &self,
        agent: &Agent,
        lease_id: &LeaseId,
        _payload: &LeasePayload,
        outcome: LeaseOutcome,
        _output: Option<&[u8]>,
    ) -> Result<(), ProviderError> {
        tracing::info!(agent = %agent.id, lease = %lease_id, %outcome, "conform finished");
        if outcome != LeaseOutcome::Success {
            return Ok(());
        }
        let current = match self.agents.get(&agent.id).await.map_err(Self::failed)? {
            Some(current) => current,
            None => return Ok(()),
        };
        update_with_retry(&*self.agents, current, |a| {
            (a.request_conform || a.request_full_conform).then(|| AgentUpdate {
                request_conform: Some(false),
                request_full_conform: Some(false),
                ..Default::default()
            })
        })
        .await
        .map_err(Self::failed)?;
        Ok(())
    }

    async fn cancel_lease(
        &self,
        agent: &Agent,
        lease_id: &LeaseId,
        _payload: &LeasePayload,
    ) -> Result<(), ProviderError> {
        tracing::debug!(agent = %agent.id, lease = %lease_id, "conform lease released");
        Ok(())
    }

    fn describe_payload(&self, payload: &LeasePayload) -> BTreeMap<String, String> {
        let mut described = BTreeMap::from([("type".to_string(), payload.type_tag.clone())]);
        if let Ok(conform) = ConformPayload::decode(payload) {
            described.insert("full".to_string(), conform.full.to_string());
        }
        described
    }
}

#[cfg(test)]
#[path = "conform_tests.rs"]
mod tests;
