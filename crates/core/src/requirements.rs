// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Eligibility and resource matching between an agent and a unit of work.

use crate::agent::{Agent, AgentStatus};
use crate::condition::Condition;
use crate::id::PoolId;
use crate::lease::ResourceMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How much of one named resource a lease needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    pub min: i32,
    /// Take up to this much when available; `None` takes exactly `min`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

impl ResourceRequirement {
    pub fn exactly(amount: i32) -> Self {
        Self { min: amount, max: None }
    }

    pub fn between(min: i32, max: i32) -> Self {
        Self { min, max: Some(max) }
    }
}

/// What a work provider asks of an agent before offering it a lease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, ResourceRequirement>,
    #[serde(default)]
    pub exclusive: bool,
}

impl AgentRequirements {
    /// Check `agent` against these requirements and, if it qualifies, return
    /// the amount of each resource to reserve on the new lease.
    pub fn try_allocate(&self, agent: &Agent) -> Option<ResourceMap> {
        if !agent.enabled || agent.status != AgentStatus::Ok {
            return None;
        }
        if agent.has_exclusive_lease() || (self.exclusive && !agent.leases.is_empty()) {
            return None;
        }
        if let Some(pool) = &self.pool {
            if !agent.in_pool(pool) {
                return None;
            }
        }
        if let Some(condition) = &self.condition {
            if !condition.evaluate(&agent.property_set()) {
                return None;
            }
        }

        let mut allocation = ResourceMap::new();
        for (name, requirement) in &self.resources {
            let remaining = agent.remaining_resource(name);
            if requirement.min < 0 || remaining < requirement.min {
                return None;
            }
            let amount = match requirement.max {
                Some(max) => max.min(remaining).max(requirement.min),
                None => requirement.min,
            };
            allocation.insert(name.clone(), amount);
        }
        Some(allocation)
    }

    pub fn is_satisfied_by(&self, agent: &Agent) -> bool {
        self.try_allocate(agent).is_some()
    }
}

#[cfg(test)]
#[path = "requirements_tests.rs"]
mod tests;
