// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dv_core::test_support::{agent, agent_in_session, lease};

#[test]
fn counts_live_agents_only() {
    let idle = agent("idle");
    let mut busy = agent_in_session("busy", 60_000);
    busy.status = AgentStatus::Busy;
    busy.leases = vec![lease("one"), lease("two")];
    let mut disabled = agent_in_session("off", 60_000);
    disabled.enabled = false;
    let mut gone = agent("gone");
    gone.deleted = true;

    let metrics = AgentMetrics::collect(&[idle, busy, disabled, gone]);

    assert_eq!(metrics.total, 3);
    assert_eq!(metrics.enabled, 2);
    assert_eq!(metrics.disabled, 1);
    assert_eq!(metrics.with_session, 2);
    assert_eq!(metrics.active_leases, 2);
    assert_eq!(metrics.by_status.get(&AgentStatus::Busy), Some(&1));
    assert_eq!(metrics.by_status.get(&AgentStatus::Ok), Some(&1));
    assert_eq!(metrics.by_status.get(&AgentStatus::Stopped), Some(&1));
}

#[test]
fn empty_fleet() {
    assert_eq!(AgentMetrics::collect(&[]), AgentMetrics::default());
}
