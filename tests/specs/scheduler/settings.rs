//! Optimistic concurrency specs

use crate::prelude::*;

/// Scenario B: two settings writes race on the same snapshot. Exactly one
/// lands; the loser re-reads, reapplies, and both changes survive.
#[tokio::test]
async fn racing_settings_updates_both_apply() {
    let farm = Farm::new(&[]);
    let snapshot = farm.connect("A").await;
    assert_eq!(snapshot.update_index, 1);

    let disable = AgentSettings { enabled: Some(false), ..Default::default() };
    let comment = AgentSettings { comment: Some(Some("reimaged".into())), ..Default::default() };

    let winner = farm.agents.try_update_settings(&snapshot, &disable).await.unwrap();
    let loser = farm.agents.try_update_settings(&snapshot, &comment).await.unwrap();
    assert_eq!(winner.map(|a| a.update_index), Some(2));
    assert!(loser.is_none());

    let fresh = farm.agents.get(&snapshot.id).await.unwrap().unwrap();
    assert_eq!(fresh.update_index, 2);
    let merged = farm.agents.try_update_settings(&fresh, &comment).await.unwrap().unwrap();

    assert_eq!(merged.update_index, 3);
    assert!(!merged.enabled);
    assert_eq!(merged.comment.as_deref(), Some("reimaged"));
}

/// The scheduler-level entry point retries on its own.
#[tokio::test]
async fn scheduler_settings_retry_until_applied() {
    let farm = Farm::new(&[]);
    let agent = farm.connect("A").await;

    let disable = AgentSettings { enabled: Some(false), ..Default::default() };
    let comment = AgentSettings { comment: Some(Some("reimaged".into())), ..Default::default() };
    let (a, b) = tokio::join!(
        farm.scheduler.update_settings(&agent.id, &disable),
        farm.scheduler.update_settings(&agent.id, &comment),
    );
    a.unwrap();
    b.unwrap();

    let stored = farm.agents.get(&agent.id).await.unwrap().unwrap();
    assert_eq!(stored.update_index, 3);
    assert!(!stored.enabled);
    assert_eq!(stored.comment.as_deref(), Some("reimaged"));
}
