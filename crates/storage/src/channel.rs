// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-update notifications.
//!
//! Publishing tells every subscriber that an agent document changed so that
//! anything blocked on that agent (a long-poll waiter, say) re-reads it.
//! Delivery is best effort: a slow subscriber skips what it missed.

use dv_core::AgentId;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct UpdateChannel {
    tx: broadcast::Sender<AgentId>,
}

impl UpdateChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Announce a change to `agent_id`. Having no subscribers is fine.
    pub fn publish(&self, agent_id: &AgentId) {
        let _ = self.tx.send(agent_id.clone());
    }

    /// Invoke `callback` for every published id until the returned handle
    /// is dropped. Must be called from within a tokio runtime.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(AgentId) + Send + Sync + 'static,
    {
        let mut rx = self.tx.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(agent_id) => callback(agent_id),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "update subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Subscription { handle }
    }
}

impl Default for UpdateChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Keeps a subscription alive; dropping it stops delivery.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
