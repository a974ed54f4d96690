// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool configuration.

use async_trait::async_trait;
use dv_core::Pool;
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolSourceError {
    #[error("pool configuration unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the configured pools. Callers cache the result.
#[async_trait]
pub trait PoolSource: Send + Sync + 'static {
    async fn pools(&self) -> Result<Vec<Pool>, PoolSourceError>;
}

/// Pools fixed at startup, replaceable on reload.
#[derive(Default)]
pub struct StaticPoolSource {
    pools: RwLock<Vec<Pool>>,
}

impl StaticPoolSource {
    pub fn new(pools: Vec<Pool>) -> Self {
        Self { pools: RwLock::new(pools) }
    }

    pub fn replace(&self, pools: Vec<Pool>) {
        *self.pools.write() = pools;
    }
}

#[async_trait]
impl PoolSource for StaticPoolSource {
    async fn pools(&self) -> Result<Vec<Pool>, PoolSourceError> {
        Ok(self.pools.read().clone())
    }
}
