// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process wiring of the scheduler.

use crate::error::DaemonError;
use dv_adapters::{DowntimeFlag, MemoryLeaseLog, MemorySessionStore, ProviderRegistry, StaticPoolSource};
use dv_core::{Pool, SystemClock};
use dv_engine::{ConformProvider, LeaseScheduler, SchedulerConfig, SchedulerDeps};
use dv_storage::{AgentCollection, MemoryAgentStore};
use std::future::Future;
use std::sync::Arc;

pub type DaemonScheduler = LeaseScheduler<MemoryAgentStore, SystemClock>;

/// A scheduler over in-memory stores plus the handles an operator surface
/// needs: the downtime switch and the reloadable pool list.
pub struct Daemon {
    scheduler: Arc<DaemonScheduler>,
    downtime: DowntimeFlag,
    pools: Arc<StaticPoolSource>,
}

impl Daemon {
    /// Must be called within a Tokio runtime.
    pub fn build(config: SchedulerConfig, pools: Vec<Pool>) -> Self {
        let agents = Arc::new(
            AgentCollection::new(Arc::new(MemoryAgentStore::new()), SystemClock)
                .with_lease_index_ttl(config.lease_index_ttl),
        );
        let providers = ProviderRegistry::new().with(Arc::new(ConformProvider::new(Arc::clone(&agents))));
        let pools = Arc::new(StaticPoolSource::new(pools));
        let downtime = DowntimeFlag::new();
        let scheduler = Arc::new(LeaseScheduler::new(
            SchedulerDeps {
                agents,
                sessions: Arc::new(MemorySessionStore::new()),
                lease_log: Arc::new(MemoryLeaseLog::new()),
                providers,
                pools: pools.clone(),
                downtime: Arc::new(downtime.clone()),
            },
            config,
        ));
        Self { scheduler, downtime, pools }
    }

    pub fn scheduler(&self) -> &Arc<DaemonScheduler> {
        &self.scheduler
    }

    pub fn downtime(&self) -> &DowntimeFlag {
        &self.downtime
    }

    /// Swap in a new pool list; agents pick it up on their next session
    /// start or property change.
    pub fn reload_pools(&self, pools: Vec<Pool>) {
        tracing::info!(pools = pools.len(), "pool configuration reloaded");
        self.pools.replace(pools);
        self.scheduler.pool_cache().invalidate();
    }

    /// Run maintenance until `shutdown` resolves, then end every in-flight
    /// long-poll and wait for the maintenance loop to stop.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<(), DaemonError> {
        let indexed = self.scheduler.agents().rebuild_lease_index().await?;
        tracing::info!(leases = indexed, "drover daemon started");

        let maintenance = self.scheduler.spawn_maintenance();
        shutdown.await;
        tracing::info!("shutting down");
        self.scheduler.shutdown();
        if let Err(e) = maintenance.await {
            tracing::warn!(error = %e, "maintenance task ended abnormally");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
