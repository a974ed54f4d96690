// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dv_core::test_support::{agent, agent_in_session, properties, T0};

fn roster() -> Vec<Agent> {
    let mut a = agent_in_session("a", 60_000);
    a.dynamic_pools = vec!["linux".into()];
    a.properties = properties(&["OSFamily=Linux"]);
    a.updated_at_ms = T0 + 10;

    let mut b = agent("b");
    b.explicit_pools = vec!["linux".into()];
    b.enabled = false;

    let mut c = agent("c");
    c.deleted = true;
    c.ephemeral = true;

    vec![a, b, c]
}

fn ids(agents: &[Agent]) -> Vec<&str> {
    agents.iter().map(|a| a.id.as_str()).collect()
}

#[yare::parameterized(
    default_hides_deleted = { AgentQuery::default(), &["a", "b"] },
    everything            = { AgentQuery::everything(), &["a", "b", "c"] },
    only_deleted          = { AgentQuery { deleted: DeletedMode::Only, ..Default::default() }, &["c"] },
    pool                  = { AgentQuery::in_pool("linux"), &["a", "b"] },
    property              = { AgentQuery { property: Some("OSFamily=Linux".into()), ..Default::default() }, &["a"] },
    status                = { AgentQuery { status: Some(AgentStatus::Stopped), ..Default::default() }, &["b"] },
    enabled               = { AgentQuery { enabled: Some(false), ..Default::default() }, &["b"] },
    modified_after        = { AgentQuery { modified_after_ms: Some(T0), ..Default::default() }, &["a"] },
    ephemeral             = { AgentQuery { ephemeral: Some(true), deleted: DeletedMode::Include, ..Default::default() }, &["c"] },
)]
fn filters(query: AgentQuery, expected: &[&str]) {
    let agents = roster();
    assert_eq!(ids(&query.paginate(agents.iter())), expected);
}

#[test]
fn pagination_applies_after_filtering() {
    let agents = roster();
    let query = AgentQuery { index: 1, count: Some(1), ..AgentQuery::everything() };
    assert_eq!(ids(&query.paginate(agents.iter())), ["b"]);
}

#[test]
fn status_changed_before_is_strict() {
    let agents = roster();
    let query = AgentQuery { status_changed_before_ms: Some(T0), ..Default::default() };
    assert!(query.paginate(agents.iter()).is_empty());
    let query = AgentQuery { status_changed_before_ms: Some(T0 + 1), ..Default::default() };
    assert_eq!(query.paginate(agents.iter()).len(), 2);
}
