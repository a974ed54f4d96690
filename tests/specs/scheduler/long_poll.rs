//! Long-poll lease assignment specs

use crate::prelude::*;

/// Scenario C: the provider answering after 100ms wins over the one
/// answering after 2s; the slow lease is handed back once it arrives and
/// never shows up on the agent.
#[tokio::test(start_paused = true)]
async fn first_offer_wins_and_loser_is_released() {
    let slow = FakeWorkProvider::new("slow", "slow");
    let fast = FakeWorkProvider::new("fast", "fast");
    let l1 = slow.make_lease("L1", T0);
    let l2 = fast.make_lease("L2", T0);
    slow.push_late_lease(l1.clone(), Duration::from_secs(2));
    fast.push_lease(l2.clone(), Duration::from_millis(100));
    let farm = Farm::new(&[slow.clone(), fast.clone()]);
    let agent = farm.connect("A").await;

    let request = SessionUpdateRequest::new(agent.session_id.clone().unwrap(), AgentStatus::Ok);
    let polled = farm.scheduler.update_session(&agent.id, &request, &CancellationToken::new()).await.unwrap();

    assert_eq!(polled.leases.len(), 1);
    assert_eq!(polled.leases[0].id, l2.id);
    assert_eq!(fast.started(), [l2.id.clone()]);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(slow.cancelled(), [l1.id.clone()]);
    let stored = farm.agents.get(&agent.id).await.unwrap().unwrap();
    assert!(stored.leases.iter().all(|l| l.id != l1.id));
    assert!(farm.lease_log.get(&l1.id).await.unwrap().is_none());
}
