//! Expired session sweep specs

use crate::prelude::*;

/// Scenario D: a session past its expiry is ended by maintenance; the agent
/// is Stopped without a session and its leases are finalized as failed.
#[tokio::test(start_paused = true)]
async fn expired_session_is_swept() {
    let builds = FakeWorkProvider::new("builds", "build");
    let lease = builds.make_lease("compile", T0);
    builds.push_lease(lease.clone(), Duration::from_millis(10));
    let farm = Farm::new(&[builds.clone()]);
    let agent = farm.connect("A").await;
    let request = SessionUpdateRequest::new(agent.session_id.clone().unwrap(), AgentStatus::Ok);
    let agent = farm.scheduler.update_session(&agent.id, &request, &CancellationToken::new()).await.unwrap();
    assert_eq!(agent.leases.len(), 1);

    farm.clock.advance(Duration::from_secs(360));
    let report = farm.scheduler.tick().await.unwrap();

    assert_eq!(report.expired_terminated, 1);
    let swept = farm.agents.get(&agent.id).await.unwrap().unwrap();
    assert_eq!(swept.status, AgentStatus::Stopped);
    assert!(swept.session_id.is_none());
    assert!(swept.leases.is_empty());
    let record = farm.lease_log.get(&lease.id).await.unwrap().unwrap();
    assert_eq!(record.outcome, Some(LeaseOutcome::Failure));
    assert_eq!(builds.finished(), [(lease.id, LeaseOutcome::Failure)]);
}
