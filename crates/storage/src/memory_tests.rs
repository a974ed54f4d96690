// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dv_core::test_support::{agent, agent_in_session, T0};

fn disable() -> AgentUpdate {
    AgentUpdate { enabled: Some(false), ..Default::default() }
}

#[tokio::test]
async fn insert_rejects_duplicate_id() {
    let store = MemoryAgentStore::new();
    assert!(store.insert(&agent("a")).await.unwrap());
    assert!(!store.insert(&agent("a")).await.unwrap());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn matching_index_applies_and_bumps() {
    let store = MemoryAgentStore::new();
    store.insert(&agent("a")).await.unwrap();

    let updated = store.update_if(&"a".into(), 0, &disable(), T0 + 7).await.unwrap().unwrap();
    assert_eq!(updated.update_index, 1);
    assert_eq!(updated.updated_at_ms, T0 + 7);
    assert!(!updated.enabled);
    assert_eq!(store.get(&"a".into()).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn stale_index_changes_nothing() {
    let store = MemoryAgentStore::new();
    store.insert(&agent("a")).await.unwrap();
    store.update_if(&"a".into(), 0, &disable(), T0).await.unwrap();

    let stale = AgentUpdate { comment: Some(Some("late".into())), ..Default::default() };
    assert_eq!(store.update_if(&"a".into(), 0, &stale, T0).await.unwrap(), None);

    let stored = store.get(&"a".into()).await.unwrap().unwrap();
    assert_eq!(stored.update_index, 1);
    assert_eq!(stored.comment, None);
}

#[tokio::test]
async fn update_of_missing_agent_matches_nothing() {
    let store = MemoryAgentStore::new();
    assert_eq!(store.update_if(&"ghost".into(), 0, &disable(), T0).await.unwrap(), None);
}

#[tokio::test]
async fn find_expired_orders_by_expiry_and_limits() {
    let store = MemoryAgentStore::new();
    store.insert(&agent_in_session("late", 500)).await.unwrap();
    store.insert(&agent_in_session("early", 100)).await.unwrap();
    store.insert(&agent_in_session("live", 10_000)).await.unwrap();
    store.insert(&agent("idle")).await.unwrap();

    let expired = store.find_expired(T0 + 1_000, 10).await.unwrap();
    let ids: Vec<_> = expired.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["early", "late"]);

    assert_eq!(store.find_expired(T0 + 1_000, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn remove_reports_presence() {
    let store = MemoryAgentStore::new();
    store.insert(&agent("a")).await.unwrap();
    assert!(store.remove(&"a".into()).await.unwrap());
    assert!(!store.remove(&"a".into()).await.unwrap());
    assert!(store.is_empty());
}
