// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named agent pools.

use crate::condition::Condition;
use crate::id::PoolId;
use crate::properties::PropertySet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    #[serde(default)]
    pub name: String,
    /// Agents whose properties satisfy this join the pool automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Pool {
    pub fn new(id: impl Into<PoolId>) -> Self {
        let id = id.into();
        Self { name: id.to_string(), id, condition: None }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Whether an agent with `properties` is a dynamic member.
    pub fn matches(&self, properties: &PropertySet) -> bool {
        self.condition.as_ref().is_some_and(|c| c.evaluate(properties))
    }
}
