// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dv_core::test_support::{agent_in_session, lease, T0};

#[tokio::test]
async fn started_record_copies_lease_and_session() {
    let agent = agent_in_session("a", 60_000);
    let job = lease("job");
    let record = LeaseRecord::started(&agent, &job);
    assert_eq!(record.id, job.id);
    assert_eq!(record.session_id, agent.session_id);
    assert_eq!(record.payload_type, "test");
    assert!(!record.is_finished());
}

#[tokio::test]
async fn finish_records_first_outcome_only() {
    let log = MemoryLeaseLog::new();
    let agent = agent_in_session("a", 60_000);
    let job = lease("job");
    log.add(LeaseRecord::started(&agent, &job)).await.unwrap();

    assert!(log.finish(&job.id, LeaseOutcome::Success, T0 + 5, Some(b"ok".to_vec())).await.unwrap());
    assert!(!log.finish(&job.id, LeaseOutcome::Failure, T0 + 9, None).await.unwrap());

    let record = log.get(&job.id).await.unwrap().unwrap();
    assert_eq!(record.outcome, Some(LeaseOutcome::Success));
    assert_eq!(record.finished_at_ms, Some(T0 + 5));
    assert_eq!(record.output.as_deref(), Some(&b"ok"[..]));
}

#[tokio::test]
async fn finish_of_unknown_lease_is_not_found() {
    let log = MemoryLeaseLog::new();
    let err = log.finish(&LeaseId::new(), LeaseOutcome::Failure, T0, None).await.unwrap_err();
    assert!(matches!(err, LeaseLogError::NotFound(_)));
}

#[tokio::test]
async fn find_filters_by_agent_session_and_state() {
    let log = MemoryLeaseLog::new();
    let a = agent_in_session("a", 60_000);
    let b = agent_in_session("b", 60_000);
    let (one, two, three) = (lease("1"), lease("2"), lease("3"));
    log.add(LeaseRecord::started(&a, &one)).await.unwrap();
    log.add(LeaseRecord::started(&a, &two)).await.unwrap();
    log.add(LeaseRecord::started(&b, &three)).await.unwrap();
    log.finish(&one.id, LeaseOutcome::Success, T0, None).await.unwrap();

    let by_agent = LeaseLogQuery { agent_id: Some("a".into()), ..Default::default() };
    assert_eq!(log.find(&by_agent).await.unwrap().len(), 2);

    let open = LeaseLogQuery { unfinished_only: true, ..by_agent.clone() };
    let found = log.find(&open).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, two.id);

    let by_session = LeaseLogQuery { session_id: b.session_id.clone(), ..Default::default() };
    assert_eq!(log.find(&by_session).await.unwrap()[0].id, three.id);
}
