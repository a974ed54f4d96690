//! Registration and session start specs

use crate::prelude::*;

/// Scenario A: a new agent starts at update index 0 without a session; its
/// first session start lands at index 1 with no leases.
#[tokio::test]
async fn register_then_start_session() {
    let farm = Farm::new(&[]);
    let id = AgentId::new("A");

    let registered = farm.scheduler.register_agent(&id, "key", false).await.unwrap();
    assert_eq!(registered.update_index, 0);
    assert!(registered.session_id.is_none());

    let request = SessionStartRequest {
        status: AgentStatus::Ok,
        properties: vec!["OSFamily=Linux".into()],
        resources: Default::default(),
    };
    let started = farm.scheduler.create_session(&id, "key", &request).await.unwrap();
    assert!(started.session_id.is_some());
    assert_eq!(started.update_index, 1);
    assert!(started.leases.is_empty());
    assert_eq!(started.properties, ["OSFamily=Linux"]);
}
