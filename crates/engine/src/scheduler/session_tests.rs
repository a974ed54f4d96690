// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::SchedulerError;
use crate::request::{LeaseReport, ReportedLeaseState, SessionUpdateRequest};
use crate::test_helpers::{setup, start_request, TestContext, KEY};
use dv_adapters::{FakeWorkProvider, LeaseLog, SessionStore};
use dv_core::test_support::{properties, T0};
use dv_core::{Agent, AgentId, AgentStatus, Lease, LeaseOutcome, PoolId};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn builds() -> FakeWorkProvider {
    FakeWorkProvider::new("builds", "build")
}

/// Connect `id` and hand it one lease through a long-poll.
async fn connect_with_lease(ctx: &TestContext, provider: &FakeWorkProvider, id: &str) -> (Agent, Lease) {
    let session = ctx.connect(id).await;
    let lease = provider.make_lease("compile", T0);
    provider.push_lease(lease.clone(), Duration::from_millis(10));
    let request = SessionUpdateRequest::new(session.session_id.clone().unwrap(), AgentStatus::Ok);
    (ctx.poll(&session, request).await, lease)
}

fn report(agent: &Agent, status: AgentStatus, leases: Vec<LeaseReport>) -> SessionUpdateRequest {
    SessionUpdateRequest::new(agent.session_id.clone().unwrap(), status).with_leases(leases)
}

// ── create_session ──────────────────────────────────────────────────────

#[tokio::test]
async fn start_assigns_session_and_pools() {
    let ctx = setup(&[]);
    let registered = ctx.register("a").await;
    assert_eq!(registered.update_index, 0);
    assert!(!registered.has_session());

    let agent = ctx.connect("a").await;
    assert_eq!(agent.update_index, 1);
    assert!(agent.leases.is_empty());
    assert_eq!(agent.status, AgentStatus::Ok);
    assert_eq!(agent.properties, properties(&["OSFamily=Linux"]));
    assert_eq!(agent.dynamic_pools, [PoolId::new("linux")]);
    assert_eq!(agent.session_expires_at_ms, Some(T0 + 300_000));

    let record = ctx.sessions.get(agent.session_id.as_ref().unwrap()).await.unwrap().unwrap();
    assert_eq!(record.agent_id, agent.id);
    assert_eq!(record.pools, [PoolId::new("linux")]);
    assert_eq!(record.finished_at_ms, None);
}

#[tokio::test]
async fn start_rejects_unknown_and_mismatched_agents() {
    let ctx = setup(&[]);
    let request = start_request(AgentStatus::Ok);
    let id = AgentId::new("a");

    let unknown = ctx.scheduler.create_session(&id, KEY, &request).await;
    assert!(matches!(unknown, Err(SchedulerError::AgentNotFound(_))));

    ctx.register("a").await;
    let wrong_key = ctx.scheduler.create_session(&id, "other-key", &request).await;
    assert!(matches!(wrong_key, Err(SchedulerError::EnrollmentMismatch(_))));

    ctx.scheduler.delete_agent(&id).await.unwrap();
    let deleted = ctx.scheduler.create_session(&id, KEY, &request).await;
    assert!(matches!(deleted, Err(SchedulerError::EnrollmentMismatch(_))));
}

#[tokio::test(start_paused = true)]
async fn restart_fails_leftover_leases_and_keeps_status_time() {
    let provider = builds();
    let ctx = setup(&[provider.clone()]);
    let (first, lease) = connect_with_lease(&ctx, &provider, "a").await;
    ctx.clock.advance(Duration::from_secs(30));

    let second = ctx.scheduler.create_session(&first.id, KEY, &start_request(AgentStatus::Ok)).await.unwrap();

    assert_ne!(second.session_id, first.session_id);
    assert!(second.leases.is_empty());
    assert_eq!(second.last_status_change_ms, first.last_status_change_ms);
    assert_eq!(provider.finished(), [(lease.id.clone(), LeaseOutcome::Failure)]);
    let record = ctx.lease_log.get(&lease.id).await.unwrap().unwrap();
    assert_eq!(record.outcome, Some(LeaseOutcome::Failure));
    let prior = ctx.sessions.get(first.session_id.as_ref().unwrap()).await.unwrap().unwrap();
    assert_eq!(prior.finished_at_ms, Some(T0 + 30_000));
}

// ── update_session ──────────────────────────────────────────────────────

#[tokio::test]
async fn mismatched_session_is_rejected_unless_stopping() {
    let ctx = setup(&[]);
    let agent = ctx.connect("a").await;
    let stale = SessionUpdateRequest::new(dv_core::SessionId::new(), AgentStatus::Ok);
    let cancel = CancellationToken::new();

    let rejected = ctx.scheduler.update_session(&agent.id, &stale, &cancel).await;
    assert!(matches!(rejected, Err(SchedulerError::InvalidSession { .. })));

    let stopping = SessionUpdateRequest::new(dv_core::SessionId::new(), AgentStatus::Stopping);
    let unchanged = ctx.scheduler.update_session(&agent.id, &stopping, &cancel).await.unwrap();
    assert_eq!(unchanged, agent);
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let ctx = setup(&[]);
    let agent = ctx.connect("a").await;
    ctx.clock.advance(Duration::from_secs(300));

    let result = ctx.scheduler.update_session(&agent.id, &report(&agent, AgentStatus::Ok, vec![]), &CancellationToken::new()).await;
    assert!(matches!(result, Err(SchedulerError::InvalidSession { reason, .. }) if reason == "session expired"));
}

#[tokio::test(start_paused = true)]
async fn completion_is_finalized_with_output() {
    let provider = builds();
    let ctx = setup(&[provider.clone()]);
    let (agent, lease) = connect_with_lease(&ctx, &provider, "a").await;

    let mut done = LeaseReport::completed(lease.id.clone(), LeaseOutcome::Success);
    done.output = Some(b"ok".to_vec());
    let agent = ctx.poll(&agent, report(&agent, AgentStatus::Ok, vec![done])).await;

    assert!(agent.leases.is_empty());
    assert_eq!(provider.finished(), [(lease.id.clone(), LeaseOutcome::Success)]);
    let record = ctx.lease_log.get(&lease.id).await.unwrap().unwrap();
    assert_eq!(record.outcome, Some(LeaseOutcome::Success));
    assert_eq!(record.output.as_deref(), Some(&b"ok"[..]));
}

#[tokio::test(start_paused = true)]
async fn expiry_renews_inside_window_only() {
    let ctx = setup(&[]);
    let agent = ctx.connect("a").await;

    ctx.clock.advance(Duration::from_secs(30));
    let early = ctx.poll(&agent, report(&agent, AgentStatus::Ok, vec![])).await;
    assert_eq!(early.session_expires_at_ms, agent.session_expires_at_ms);

    ctx.clock.advance(Duration::from_secs(60));
    let renewed = ctx.poll(&early, report(&early, AgentStatus::Ok, vec![])).await;
    assert_eq!(renewed.session_expires_at_ms, Some(T0 + 90_000 + 300_000));
}

#[tokio::test(start_paused = true)]
async fn changed_properties_recompute_dynamic_pools() {
    let ctx = setup(&[]);
    let agent = ctx.connect("a").await;

    let mut request = report(&agent, AgentStatus::Ok, vec![]);
    request.properties = Some(properties(&["OSFamily=Windows", "RequestedPools=nightly"]));
    let agent = ctx.poll(&agent, request).await;

    assert_eq!(agent.dynamic_pools, [PoolId::new("nightly")]);
}

#[tokio::test(start_paused = true)]
async fn stopping_cancels_leases_then_terminates_once_drained() {
    let provider = builds();
    let ctx = setup(&[provider.clone()]);
    let (agent, lease) = connect_with_lease(&ctx, &provider, "a").await;

    let active = vec![LeaseReport::new(lease.id.clone(), ReportedLeaseState::Active)];
    let draining = ctx.poll(&agent, report(&agent, AgentStatus::Stopping, active)).await;
    assert_eq!(draining.status, AgentStatus::Stopping);
    assert_eq!(draining.leases[0].state, dv_core::LeaseState::Cancelled);

    let confirmed = vec![LeaseReport::new(lease.id.clone(), ReportedLeaseState::Cancelled)];
    let stopped = ctx.poll(&draining, report(&draining, AgentStatus::Stopping, confirmed)).await;
    assert_eq!(stopped.status, AgentStatus::Stopped);
    assert!(!stopped.has_session());
    assert_eq!(provider.finished(), [(lease.id, LeaseOutcome::Cancelled)]);
    let record = ctx.sessions.get(agent.session_id.as_ref().unwrap()).await.unwrap().unwrap();
    assert!(record.finished_at_ms.is_some());
}

// ── terminate_session ───────────────────────────────────────────────────

#[tokio::test]
async fn terminating_ephemeral_agent_deletes_it() {
    let ctx = setup(&[]);
    let id = AgentId::new("e");
    ctx.scheduler.register_agent(&id, KEY, true).await.unwrap();
    let agent = ctx.scheduler.create_session(&id, KEY, &start_request(AgentStatus::Ok)).await.unwrap();

    let terminated = ctx.scheduler.terminate_session(agent).await.unwrap();
    assert!(terminated.deleted);
    assert_eq!(terminated.status, AgentStatus::Stopped);
    assert!(terminated.session_id.is_none());
}

#[tokio::test]
async fn terminating_without_session_writes_nothing() {
    let ctx = setup(&[]);
    let agent = ctx.register("a").await;
    let terminated = ctx.scheduler.terminate_session(agent.clone()).await.unwrap();
    assert_eq!(terminated.update_index, agent.update_index);
}
