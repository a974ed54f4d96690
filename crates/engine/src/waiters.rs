// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local table of in-flight long-polls.
//!
//! Lets an agent-update notification cut a long-poll short so the waiter
//! re-reads the agent. Nothing here is durable; the lock is only held around
//! map insert/remove and never across an await.

use dv_core::AgentId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Registration {
    serial: u64,
    token: CancellationToken,
}

#[derive(Default)]
pub struct WaiterTable {
    waiters: Mutex<HashMap<AgentId, Registration>>,
    next_serial: AtomicU64,
}

impl WaiterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `agent_id`, replacing any earlier one. The
    /// entry lives exactly as long as the returned guard.
    pub fn register(self: &Arc<Self>, agent_id: &AgentId) -> WaiterGuard {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.waiters.lock().insert(agent_id.clone(), Registration { serial, token: token.clone() });
        WaiterGuard { table: Arc::clone(self), agent_id: agent_id.clone(), serial, token }
    }

    /// Cancel the waiter for `agent_id`, if any.
    pub fn wake(&self, agent_id: &AgentId) -> bool {
        match self.waiters.lock().get(agent_id) {
            Some(registration) => {
                registration.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes its registration on drop, unless a newer one replaced it.
pub struct WaiterGuard {
    table: Arc<WaiterTable>,
    agent_id: AgentId,
    serial: u64,
    token: CancellationToken,
}

impl WaiterGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        let mut waiters = self.table.waiters.lock();
        if waiters.get(&self.agent_id).is_some_and(|r| r.serial == self.serial) {
            waiters.remove(&self.agent_id);
        }
    }
}

#[cfg(test)]
#[path = "waiters_tests.rs"]
mod tests;
