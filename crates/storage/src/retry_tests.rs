// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::memory::MemoryAgentStore;
use dv_core::{AgentId, FakeClock};
use std::sync::Arc;

fn collection() -> Arc<AgentCollection<MemoryAgentStore, FakeClock>> {
    Arc::new(AgentCollection::new(Arc::new(MemoryAgentStore::new()), FakeClock::new()))
}

fn bump(agent: &Agent) -> Option<AgentUpdate> {
    Some(AgentUpdate {
        conform_attempt_count: Some(agent.conform_attempt_count + 1),
        ..Default::default()
    })
}

#[tokio::test]
async fn stale_snapshot_is_refetched_and_recomputed() {
    let collection = collection();
    let stale = collection.create_or_reset(&"a".into(), "key", false).await.unwrap();
    collection.try_update(&stale, bump(&stale).unwrap()).await.unwrap().unwrap();

    let mut attempts = 0;
    let written = update_with_retry(&*collection, stale, |agent| {
        attempts += 1;
        bump(agent)
    })
    .await
    .unwrap();

    assert_eq!(attempts, 2);
    assert_eq!(written.conform_attempt_count, 2);
    assert_eq!(written.update_index, 2);
}

#[tokio::test]
async fn compute_returning_none_writes_nothing() {
    let collection = collection();
    let agent = collection.create_or_reset(&"a".into(), "key", false).await.unwrap();
    let result = update_with_retry(&*collection, agent.clone(), |_| None).await.unwrap();
    assert_eq!(result, agent);
}

#[tokio::test]
async fn vanished_agent_fails_with_not_found() {
    let collection = collection();
    let agent = collection.create_or_reset(&"a".into(), "key", false).await.unwrap();
    collection.force_delete(&agent.id).await.unwrap();

    let err = update_with_retry(&*collection, agent, bump).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == AgentId::new("a")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_never_lost() {
    const WRITERS: u32 = 16;
    const ROUNDS: u32 = 8;

    let collection = collection();
    let agent = collection.create_or_reset(&"a".into(), "key", false).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..WRITERS {
        let collection = Arc::clone(&collection);
        let snapshot = agent.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..ROUNDS {
                update_with_retry(&*collection, snapshot.clone(), bump).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let final_agent = collection.get(&agent.id).await.unwrap().unwrap();
    assert_eq!(final_agent.conform_attempt_count, WRITERS * ROUNDS);
    assert_eq!(final_agent.update_index, WRITERS * ROUNDS);
}
