// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dv_core::{Agent, AgentStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fleet snapshot taken on each maintenance pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentMetrics {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub with_session: usize,
    pub active_leases: usize,
    pub by_status: BTreeMap<AgentStatus, usize>,
}

impl AgentMetrics {
    /// Summarize `agents`, skipping deleted ones.
    pub fn collect(agents: &[Agent]) -> Self {
        let mut metrics = Self::default();
        for agent in agents.iter().filter(|a| !a.deleted) {
            metrics.total += 1;
            if agent.enabled {
                metrics.enabled += 1;
            } else {
                metrics.disabled += 1;
            }
            if agent.has_session() {
                metrics.with_session += 1;
            }
            metrics.active_leases += agent.leases.len();
            *metrics.by_status.entry(agent.status).or_default() += 1;
        }
        metrics
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
