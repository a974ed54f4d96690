// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-compute-write loop for agent updates.

use crate::collection::AgentCollection;
use crate::error::StoreError;
use crate::store::AgentStore;
use crate::update::AgentUpdate;
use dv_core::{Agent, Clock};

/// Apply `compute` to `agent` until a write lands.
///
/// `compute` sees the freshest snapshot on every attempt and returns the delta
/// to write, or `None` when the snapshot already needs nothing. On a lost
/// write the agent is re-read and `compute` runs again; if the agent has
/// vanished the loop fails with [`StoreError::NotFound`].
pub async fn update_with_retry<S, C, F>(
    collection: &AgentCollection<S, C>,
    mut agent: Agent,
    mut compute: F,
) -> Result<Agent, StoreError>
where
    S: AgentStore,
    C: Clock,
    F: FnMut(&Agent) -> Option<AgentUpdate> + Send,
{
    loop {
        let Some(update) = compute(&agent) else {
            return Ok(agent);
        };
        if let Some(written) = collection.try_update(&agent, update).await? {
            return Ok(written);
        }
        tokio::task::yield_now().await;
        agent = match collection.get(&agent.id).await? {
            Some(fresh) => fresh,
            None => return Err(StoreError::NotFound(agent.id)),
        };
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
