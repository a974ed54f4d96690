// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: a scheduler over in-memory stores and a fake clock.

pub use dv_adapters::{FakeWorkProvider, LeaseLog, ProviderRegistry};
pub use dv_core::test_support::T0;
pub use dv_core::{AgentId, AgentStatus, FakeClock, LeaseOutcome};
pub use dv_engine::{SchedulerConfig, SessionStartRequest, SessionUpdateRequest};
pub use dv_storage::{AgentCollection, AgentSettings, MemoryAgentStore};
pub use std::sync::Arc;
pub use std::time::Duration;
pub use tokio_util::sync::CancellationToken;

use dv_adapters::{DowntimeFlag, MemoryLeaseLog, MemorySessionStore, StaticPoolSource};
use dv_engine::{LeaseScheduler, SchedulerDeps};

pub type Scheduler = LeaseScheduler<MemoryAgentStore, FakeClock>;

pub struct Farm {
    pub scheduler: Arc<Scheduler>,
    pub agents: Arc<AgentCollection<MemoryAgentStore, FakeClock>>,
    pub lease_log: Arc<MemoryLeaseLog>,
    pub clock: FakeClock,
}

impl Farm {
    pub fn new(providers: &[FakeWorkProvider]) -> Self {
        let clock = FakeClock::new();
        let agents = Arc::new(AgentCollection::new(Arc::new(MemoryAgentStore::new()), clock.clone()));
        let lease_log = Arc::new(MemoryLeaseLog::new());
        let mut registry = ProviderRegistry::new();
        for provider in providers {
            registry.register(Arc::new(provider.clone()));
        }
        let scheduler = Arc::new(LeaseScheduler::new(
            SchedulerDeps {
                agents: Arc::clone(&agents),
                sessions: Arc::new(MemorySessionStore::new()),
                lease_log: lease_log.clone(),
                providers: registry,
                pools: Arc::new(StaticPoolSource::new(Vec::new())),
                downtime: Arc::new(DowntimeFlag::new()),
            },
            SchedulerConfig::default(),
        ));
        Self { scheduler, agents, lease_log, clock }
    }

    pub async fn connect(&self, id: &str) -> dv_core::Agent {
        let id = AgentId::new(id);
        self.scheduler.register_agent(&id, "key", false).await.unwrap();
        let request = SessionStartRequest {
            status: AgentStatus::Ok,
            properties: vec!["OSFamily=Linux".into()],
            resources: Default::default(),
        };
        self.scheduler.create_session(&id, "key", &request).await.unwrap()
    }
}
