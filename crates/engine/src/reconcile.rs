// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconcile what the agent reports against what the server tracks.
//!
//! Planning is pure: the same snapshot and request always produce the same
//! plan, so a plan that lost its conditional write is simply recomputed from
//! the fresh snapshot.

use crate::request::{ReportedLeaseState, SessionUpdateRequest};
use dv_core::{properties, Agent, AgentStatus, Lease, LeaseOutcome, LeaseState};
use dv_storage::SessionChanges;
use std::time::Duration;

/// A lease leaving the agent document, to be finalized once the write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedLease {
    pub lease: Lease,
    pub outcome: LeaseOutcome,
    pub output: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionPlan {
    pub changes: SessionChanges,
    pub finished: Vec<FinishedLease>,
}

/// Compute the session write for `request` against `agent` at `now_ms`.
///
/// - A lease the server already cancelled is dropped once the agent reports
///   it cancelled or completed.
/// - Otherwise a reported completion or cancellation drops the lease, and a
///   pending lease reported active becomes active.
/// - Leases the agent does not mention are kept; it learns of them from the
///   response.
/// - While the agent is stopping or busy every remaining lease is flagged
///   cancelled, but stays listed until the agent confirms.
/// - The expiry is pushed out only once it is within `renewal_window`.
pub fn plan_session_update(
    agent: &Agent,
    request: &SessionUpdateRequest,
    now_ms: u64,
    renewal_window: Duration,
    session_lifetime: Duration,
) -> SessionPlan {
    let mut kept = Vec::with_capacity(agent.leases.len());
    let mut finished = Vec::new();

    for lease in &agent.leases {
        let report = request.leases.iter().find(|r| r.id == lease.id);
        let Some(report) = report else {
            kept.push(lease.clone());
            continue;
        };
        let outcome = match report.state {
            ReportedLeaseState::Completed => Some(report.outcome.unwrap_or(LeaseOutcome::Failure)),
            ReportedLeaseState::Cancelled => Some(LeaseOutcome::Cancelled),
            ReportedLeaseState::Pending | ReportedLeaseState::Active => None,
        };
        match outcome {
            Some(outcome) => finished.push(FinishedLease {
                lease: lease.clone(),
                outcome,
                output: report.output.clone(),
            }),
            None => {
                let mut lease = lease.clone();
                if lease.state == LeaseState::Pending && report.state == ReportedLeaseState::Active {
                    lease.state = LeaseState::Active;
                }
                kept.push(lease);
            }
        }
    }

    if matches!(request.status, AgentStatus::Stopping | AgentStatus::Busy) {
        for lease in &mut kept {
            lease.state = LeaseState::Cancelled;
        }
    }

    let renew_at = agent.session_expires_at_ms.map(|at| at.saturating_sub(renewal_window.as_millis() as u64));
    let expires_at_ms = match renew_at {
        Some(renew_at) if now_ms < renew_at => None,
        _ => Some(now_ms + session_lifetime.as_millis() as u64),
    };

    SessionPlan {
        changes: SessionChanges {
            status: Some(request.status),
            expires_at_ms,
            properties: request.properties.clone().map(properties::normalize),
            resources: request.resources.clone(),
            dynamic_pools: None,
            leases: Some(kept),
        },
        finished,
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
