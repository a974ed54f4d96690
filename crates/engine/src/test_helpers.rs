// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::config::SchedulerConfig;
use crate::request::{SessionStartRequest, SessionUpdateRequest};
use crate::scheduler::{LeaseScheduler, SchedulerDeps};
use dv_adapters::{
    DowntimeFlag, FakeWorkProvider, MemoryLeaseLog, MemorySessionStore, ProviderRegistry, StaticPoolSource,
};
use dv_core::test_support::{properties, resources};
use dv_core::{Agent, AgentId, AgentStatus, FakeClock, Pool};
use dv_storage::{AgentCollection, MemoryAgentStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Convenience alias for the fully-typed test scheduler.
pub(crate) type TestScheduler = LeaseScheduler<MemoryAgentStore, FakeClock>;

pub(crate) const KEY: &str = "enrollment-key";

/// Scheduler over in-memory stores with every collaborator reachable.
pub(crate) struct TestContext {
    pub scheduler: Arc<TestScheduler>,
    pub clock: FakeClock,
    pub agents: Arc<TestCollection>,
    pub sessions: Arc<MemorySessionStore>,
    pub lease_log: Arc<MemoryLeaseLog>,
    pub pools: Arc<StaticPoolSource>,
    pub downtime: DowntimeFlag,
}

pub(crate) fn setup(providers: &[FakeWorkProvider]) -> TestContext {
    setup_with(SchedulerConfig::default(), providers)
}

pub(crate) fn setup_with(config: SchedulerConfig, providers: &[FakeWorkProvider]) -> TestContext {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(Arc::new(provider.clone()));
    }
    setup_with_registry(config, |_| registry)
}

pub(crate) type TestCollection = AgentCollection<MemoryAgentStore, FakeClock>;

/// `providers` builds the registry once the agent collection exists, for
/// providers that need it.
pub(crate) fn setup_with_registry(
    config: SchedulerConfig,
    providers: impl FnOnce(&Arc<TestCollection>) -> ProviderRegistry,
) -> TestContext {
    let clock = FakeClock::new();
    let agents = Arc::new(AgentCollection::new(Arc::new(MemoryAgentStore::new()), clock.clone()));
    let providers = providers(&agents);
    let sessions = Arc::new(MemorySessionStore::new());
    let lease_log = Arc::new(MemoryLeaseLog::new());
    let pools = Arc::new(StaticPoolSource::new(vec![Pool::new("linux").with_condition(
        "OSFamily == 'Linux'".parse().unwrap(),
    )]));
    let downtime = DowntimeFlag::new();
    let scheduler = Arc::new(LeaseScheduler::new(
        SchedulerDeps {
            agents: Arc::clone(&agents),
            sessions: sessions.clone(),
            lease_log: lease_log.clone(),
            providers,
            pools: pools.clone(),
            downtime: Arc::new(downtime.clone()),
        },
        config,
    ));
    TestContext { scheduler, clock, agents, sessions, lease_log, pools, downtime }
}

pub(crate) fn start_request(status: AgentStatus) -> SessionStartRequest {
    SessionStartRequest {
        status,
        properties: properties(&["OSFamily=Linux"]),
        resources: resources(&[("cpu", 8)]),
    }
}

impl TestContext {
    pub(crate) async fn register(&self, id: &str) -> Agent {
        self.scheduler.register_agent(&AgentId::new(id), KEY, false).await.unwrap()
    }

    /// Register `id` and start an `Ok` session for it.
    pub(crate) async fn connect(&self, id: &str) -> Agent {
        self.register(id).await;
        self.scheduler.create_session(&AgentId::new(id), KEY, &start_request(AgentStatus::Ok)).await.unwrap()
    }

    pub(crate) async fn agent(&self, id: &str) -> Agent {
        self.agents.get(&AgentId::new(id)).await.unwrap().unwrap()
    }

    /// Long-poll as `agent` with `request`, never cancelled by the caller.
    pub(crate) async fn poll(&self, agent: &Agent, request: SessionUpdateRequest) -> Agent {
        self.scheduler.update_session(&agent.id, &request, &CancellationToken::new()).await.unwrap()
    }
}
