// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent search filters.

use dv_core::{Agent, AgentStatus, PoolId};

/// How soft-deleted agents are treated by a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletedMode {
    #[default]
    Exclude,
    Include,
    Only,
}

/// Filters for [`crate::AgentStore::find`]. Unset filters match everything.
#[derive(Debug, Clone, Default)]
pub struct AgentQuery {
    pub pool: Option<PoolId>,
    pub modified_after_ms: Option<u64>,
    /// Exact `key=value` property string
    pub property: Option<String>,
    pub status: Option<AgentStatus>,
    pub enabled: Option<bool>,
    pub deleted: DeletedMode,
    pub ephemeral: Option<bool>,
    pub status_changed_before_ms: Option<u64>,
    /// Number of matching agents to skip
    pub index: usize,
    /// Maximum number of agents to return
    pub count: Option<usize>,
}

impl AgentQuery {
    /// Every agent, deleted ones included.
    pub fn everything() -> Self {
        Self { deleted: DeletedMode::Include, ..Default::default() }
    }

    pub fn in_pool(pool: impl Into<PoolId>) -> Self {
        Self { pool: Some(pool.into()), ..Default::default() }
    }

    pub fn matches(&self, agent: &Agent) -> bool {
        let deleted_ok = match self.deleted {
            DeletedMode::Exclude => !agent.deleted,
            DeletedMode::Include => true,
            DeletedMode::Only => agent.deleted,
        };
        deleted_ok
            && self.pool.as_ref().is_none_or(|p| agent.in_pool(p))
            && self.modified_after_ms.is_none_or(|t| agent.updated_at_ms > t)
            && self.property.as_ref().is_none_or(|p| agent.properties.contains(p))
            && self.status.is_none_or(|s| agent.status == s)
            && self.enabled.is_none_or(|e| agent.enabled == e)
            && self.ephemeral.is_none_or(|e| agent.ephemeral == e)
            && self.status_changed_before_ms.is_none_or(|t| agent.last_status_change_ms < t)
    }

    /// Apply `index`/`count` to an id-ordered stream of matches.
    pub fn paginate<'a>(&self, agents: impl Iterator<Item = &'a Agent>) -> Vec<Agent> {
        agents
            .filter(|a| self.matches(a))
            .skip(self.index)
            .take(self.count.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
