// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::provider::WorkProvider;
use dv_core::Agent;
use std::collections::HashMap;
use std::sync::Arc;

/// Work providers keyed by the payload type they produce.
///
/// Registration order is kept so offers are requested in a stable order,
/// though the winner is whichever answers first.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn WorkProvider>>,
    by_type: HashMap<String, usize>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `provider`, replacing any earlier one for the same payload type.
    pub fn register(&mut self, provider: Arc<dyn WorkProvider>) {
        let payload_type = provider.payload_type().to_string();
        match self.by_type.get(&payload_type).copied() {
            Some(slot) => {
                tracing::warn!(payload_type = %payload_type, provider = provider.name(), "replacing work provider");
                self.providers[slot] = provider;
            }
            None => {
                self.by_type.insert(payload_type, self.providers.len());
                self.providers.push(provider);
            }
        }
    }

    pub fn with(mut self, provider: Arc<dyn WorkProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Provider responsible for payloads tagged `payload_type`.
    pub fn get(&self, payload_type: &str) -> Option<&Arc<dyn WorkProvider>> {
        self.by_type.get(payload_type).and_then(|&slot| self.providers.get(slot))
    }

    pub fn all(&self) -> &[Arc<dyn WorkProvider>] {
        &self.providers
    }

    /// Providers whose policy allows asking them on behalf of `agent`.
    pub fn eligible(&self, agent: &Agent, in_downtime: bool) -> Vec<Arc<dyn WorkProvider>> {
        self.providers.iter().filter(|p| p.policy().permits(agent, in_downtime)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
