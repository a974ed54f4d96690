// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached pool configuration and dynamic membership.

use dv_adapters::{PoolSource, PoolSourceError};
use dv_core::{Clock, Pool, PoolId, PropertySet};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Pool list fetched from a [`PoolSource`] at most once per `ttl`.
pub struct PoolCache<C: Clock> {
    source: Arc<dyn PoolSource>,
    clock: C,
    ttl: Duration,
    cached: Mutex<Option<(u64, Arc<Vec<Pool>>)>>,
}

impl<C: Clock> PoolCache<C> {
    pub fn new(source: Arc<dyn PoolSource>, clock: C, ttl: Duration) -> Self {
        Self { source, clock, ttl, cached: Mutex::new(None) }
    }

    pub async fn pools(&self) -> Result<Arc<Vec<Pool>>, PoolSourceError> {
        let now = self.clock.epoch_ms();
        if let Some((fetched_at, pools)) = self.cached.lock().as_ref() {
            if now < fetched_at.saturating_add(self.ttl.as_millis() as u64) {
                return Ok(Arc::clone(pools));
            }
        }
        let pools = Arc::new(self.source.pools().await?);
        *self.cached.lock() = Some((now, Arc::clone(&pools)));
        tracing::debug!(pools = pools.len(), "pool configuration refreshed");
        Ok(pools)
    }

    /// Drop the cached list so the next read refetches.
    pub fn invalidate(&self) {
        *self.cached.lock() = None;
    }

    /// Dynamic pools for an agent with `properties`: every pool it asks for
    /// through `RequestedPools` plus every pool whose condition it
    /// satisfies, minus those it already holds explicitly.
    pub async fn membership(
        &self,
        explicit: &[PoolId],
        properties: &[String],
    ) -> Result<Vec<PoolId>, PoolSourceError> {
        let pools = self.pools().await?;
        let set = PropertySet::new(properties);
        let mut dynamic: Vec<PoolId> = set
            .requested_pools()
            .into_iter()
            .chain(pools.iter().filter(|p| p.matches(&set)).map(|p| p.id.clone()))
            .filter(|p| !explicit.contains(p))
            .collect();
        dynamic.sort();
        dynamic.dedup();
        Ok(dynamic)
    }
}

#[cfg(test)]
#[path = "pools_tests.rs"]
mod tests;
