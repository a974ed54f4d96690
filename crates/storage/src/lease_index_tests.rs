// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dv_core::test_support::{agent_in_session, lease};
use dv_core::FakeClock;

fn index() -> (FakeClock, ActiveLeaseIndex<FakeClock>) {
    let clock = FakeClock::new();
    (clock.clone(), ActiveLeaseIndex::new(clock, Duration::from_secs(60)))
}

#[test]
fn maps_lease_to_holder_until_removed() {
    let (_, index) = index();
    let job = lease("job");
    index.add(&"a".into(), &job);
    assert_eq!(index.agent_for(&job.id), Some(AgentId::new("a")));

    index.remove(&job.id);
    assert_eq!(index.agent_for(&job.id), None);
    assert!(index.is_empty());
}

#[test]
fn entries_expire_after_ttl() {
    let (clock, index) = index();
    let job = lease("job");
    index.add(&"a".into(), &job);

    clock.advance(Duration::from_secs(61));
    assert_eq!(index.agent_for(&job.id), None);
}

#[test]
fn tracks_children_of_parent_lease() {
    let (_, index) = index();
    let parent = lease("batch");
    let first = lease("step-1").with_parent(parent.id.clone());
    let second = lease("step-2").with_parent(parent.id.clone());
    index.add(&"a".into(), &first);
    index.add(&"b".into(), &second);

    let mut expected = vec![first.id.clone(), second.id.clone()];
    expected.sort();
    assert_eq!(index.children(&parent.id), expected);

    index.remove(&first.id);
    assert_eq!(index.children(&parent.id), vec![second.id.clone()]);
    index.remove(&second.id);
    assert!(index.children(&parent.id).is_empty());
}

#[test]
fn rebuild_replaces_contents_from_documents() {
    let (_, index) = index();
    let stale = lease("stale");
    index.add(&"gone".into(), &stale);

    let mut holder = agent_in_session("a", 60_000);
    let live = lease("live");
    holder.leases.push(live.clone());
    index.rebuild([&holder]);

    assert_eq!(index.agent_for(&stale.id), None);
    assert_eq!(index.agent_for(&live.id), Some(AgentId::new("a")));
}

#[test]
fn remove_agent_drops_all_its_leases() {
    let (_, index) = index();
    let (one, two, other) = (lease("1"), lease("2"), lease("3"));
    index.add(&"a".into(), &one);
    index.add(&"a".into(), &two);
    index.add(&"b".into(), &other);

    index.remove_agent(&"a".into());
    assert_eq!(index.len(), 1);
    assert_eq!(index.agent_for(&other.id), Some(AgentId::new("b")));
}
