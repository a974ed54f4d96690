// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work providers: the one extension point for new kinds of work.

use async_trait::async_trait;
use dv_core::{Agent, AgentStatus, Lease, LeaseId, LeaseOutcome, LeasePayload};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors from work provider callbacks
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider '{provider}' failed: {message}")]
    Failed { provider: String, message: String },
    #[error("provider does not know lease {0}")]
    UnknownLease(LeaseId),
}

/// When a provider may be asked for work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub allow_when_busy: bool,
    pub allow_when_disabled: bool,
    pub allow_during_downtime: bool,
}

impl ProviderPolicy {
    pub fn permits(&self, agent: &Agent, in_downtime: bool) -> bool {
        (self.allow_when_busy || agent.status != AgentStatus::Busy)
            && (self.allow_when_disabled || agent.enabled)
            && (self.allow_during_downtime || !in_downtime)
    }
}

/// Produces leases of one payload type and hears about their lifecycle.
///
/// `offer_lease` may block until it has something to offer; it must return
/// promptly once `cancel` fires. A lease returned after cancellation is not
/// lost: the scheduler hands it back through [`WorkProvider::cancel_lease`].
#[async_trait]
pub trait WorkProvider: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Type tag of every payload this provider produces
    fn payload_type(&self) -> &str;

    fn policy(&self) -> ProviderPolicy {
        ProviderPolicy::default()
    }

    async fn offer_lease(&self, agent: &Agent, cancel: CancellationToken) -> Result<Option<Lease>, ProviderError>;

    async fn on_lease_started(
        &self,
        agent: &Agent,
        lease_id: &LeaseId,
        payload: &LeasePayload,
    ) -> Result<(), ProviderError>;

    async fn on_lease_finished(
        &self,
        agent: &Agent,
        lease_id: &LeaseId,
        payload: &LeasePayload,
        outcome: LeaseOutcome,
        output: Option<&[u8]>,
    ) -> Result<(), ProviderError>;

    /// Take back a lease that was offered but never attached, or that an
    /// operator cancelled.
    async fn cancel_lease(&self, agent: &Agent, lease_id: &LeaseId, payload: &LeasePayload) -> Result<(), ProviderError>;

    /// Human-readable details of a payload for operator views.
    fn describe_payload(&self, payload: &LeasePayload) -> BTreeMap<String, String> {
        BTreeMap::from([("type".to_string(), payload.type_tag.clone())])
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ProviderError, ProviderPolicy, WorkProvider};
    use async_trait::async_trait;
    use dv_core::{Agent, AgentId, Lease, LeaseId, LeaseOutcome, LeasePayload};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// Recorded provider callback
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ProviderCall {
        Offer { agent: AgentId },
        Started { agent: AgentId, lease: LeaseId },
        Finished { agent: AgentId, lease: LeaseId, outcome: LeaseOutcome },
        Cancelled { agent: AgentId, lease: LeaseId },
    }

    enum Scripted {
        Lease { lease: Lease, delay: Duration, ignore_cancel: bool },
        Error(String),
        Panic,
    }

    struct FakeProviderState {
        script: VecDeque<Scripted>,
        calls: Vec<ProviderCall>,
    }

    /// Scriptable work provider.
    ///
    /// Each offer pops the next scripted response. With nothing scripted an
    /// offer waits for cancellation and returns no lease.
    #[derive(Clone)]
    pub struct FakeWorkProvider {
        name: String,
        payload_type: String,
        policy: ProviderPolicy,
        inner: Arc<Mutex<FakeProviderState>>,
    }

    impl FakeWorkProvider {
        pub fn new(name: impl Into<String>, payload_type: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                payload_type: payload_type.into(),
                policy: ProviderPolicy::default(),
                inner: Arc::new(Mutex::new(FakeProviderState { script: VecDeque::new(), calls: Vec::new() })),
            }
        }

        pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
            self.policy = policy;
            self
        }

        /// A lease whose payload carries this provider's type tag.
        pub fn make_lease(&self, name: &str, started_at_ms: u64) -> Lease {
            Lease::new(name, LeasePayload::new(self.payload_type.clone(), Vec::new()), started_at_ms)
        }

        /// Offer `lease` after `delay`, or nothing if cancelled first.
        pub fn push_lease(&self, lease: Lease, delay: Duration) {
            self.push(Scripted::Lease { lease, delay, ignore_cancel: false });
        }

        /// Offer `lease` after `delay` even if cancelled in the meantime.
        pub fn push_late_lease(&self, lease: Lease, delay: Duration) {
            self.push(Scripted::Lease { lease, delay, ignore_cancel: true });
        }

        pub fn push_error(&self, message: impl Into<String>) {
            self.push(Scripted::Error(message.into()));
        }

        pub fn push_panic(&self) {
            self.push(Scripted::Panic);
        }

        fn push(&self, scripted: Scripted) {
            self.inner.lock().script.push_back(scripted);
        }

        fn record(&self, call: ProviderCall) {
            self.inner.lock().calls.push(call);
        }

        pub fn calls(&self) -> Vec<ProviderCall> {
            self.inner.lock().calls.clone()
        }

        pub fn offer_count(&self) -> usize {
            self.calls().iter().filter(|c| matches!(c, ProviderCall::Offer { .. })).count()
        }

        pub fn started(&self) -> Vec<LeaseId> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    ProviderCall::Started { lease, .. } => Some(lease),
                    _ => None,
                })
                .collect()
        }

        pub fn finished(&self) -> Vec<(LeaseId, LeaseOutcome)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    ProviderCall::Finished { lease, outcome, .. } => Some((lease, outcome)),
                    _ => None,
                })
                .collect()
        }

        pub fn cancelled(&self) -> Vec<LeaseId> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    ProviderCall::Cancelled { lease, .. } => Some(lease),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl WorkProvider for FakeWorkProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn payload_type(&self) -> &str {
            &self.payload_type
        }

        fn policy(&self) -> ProviderPolicy {
            self.policy
        }

        #[allow(clippy::panic)]
        async fn offer_lease(&self, agent: &Agent, cancel: CancellationToken) -> Result<Option<Lease>, ProviderError> {
            self.record(ProviderCall::Offer { agent: agent.id.clone() });
            let next = self.inner.lock().script.pop_front();
            match next {
                None => {
                    cancel.cancelled().await;
                    Ok(None)
                }
                Some(Scripted::Lease { lease, delay, ignore_cancel: true }) => {
                    tokio::time::sleep(delay).await;
                    Ok(Some(lease))
                }
                Some(Scripted::Lease { lease, delay, ignore_cancel: false }) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => Ok(Some(lease)),
                        _ = cancel.cancelled() => Ok(None),
                    }
                }
                Some(Scripted::Error(message)) => Err(ProviderError::Failed { provider: self.name.clone(), message }),
                Some(Scripted::Panic) => panic!("scripted provider panic"),
            }
        }

        async fn on_lease_started(
            &self,
            agent: &Agent,
            lease_id: &LeaseId,
            _payload: &LeasePayload,
        ) -> Result<(), ProviderError> {
            self.record(ProviderCall::Started { agent: agent.id.clone(), lease: lease_id.clone() });
            Ok(())
        }

        async fn on_lease_finished(
            &self,
            agent: &Agent,
            lease_id: &LeaseId,
            _payload: &LeasePayload,
            outcome: LeaseOutcome,
            _output: Option<&[u8]>,
        ) -> Result<(), ProviderError> {
            self.record(ProviderCall::Finished { agent: agent.id.clone(), lease: lease_id.clone(), outcome });
            Ok(())
        }

        async fn cancel_lease(
            &self,
            agent: &Agent,
            lease_id: &LeaseId,
            _payload: &LeasePayload,
        ) -> Result<(), ProviderError> {
            self.record(ProviderCall::Cancelled { agent: agent.id.clone(), lease: lease_id.clone() });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWorkProvider, ProviderCall};

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
