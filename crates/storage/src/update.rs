// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field-level deltas applied by a conditional write.

use dv_core::{Agent, AgentStatus, Lease, PoolId, ResourceMap, SessionId};

/// A partial agent document. `None` leaves a field untouched; nullable fields
/// use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentUpdate {
    pub enrollment_key: Option<String>,
    pub session_id: Option<Option<SessionId>>,
    pub session_expires_at_ms: Option<Option<u64>>,
    pub status: Option<AgentStatus>,
    pub last_status_change_ms: Option<u64>,
    pub explicit_pools: Option<Vec<PoolId>>,
    pub dynamic_pools: Option<Vec<PoolId>>,
    pub properties: Option<Vec<String>>,
    pub resources: Option<ResourceMap>,
    pub leases: Option<Vec<Lease>>,
    pub enabled: Option<bool>,
    pub ephemeral: Option<bool>,
    pub deleted: Option<bool>,
    pub comment: Option<Option<String>>,
    pub request_conform: Option<bool>,
    pub request_full_conform: Option<bool>,
    pub request_restart: Option<bool>,
    pub request_shutdown: Option<bool>,
    pub request_force_restart: Option<bool>,
    pub last_shutdown_reason: Option<Option<String>>,
    pub conform_attempt_count: Option<u32>,
    pub last_conform_at_ms: Option<Option<u64>>,
    pub upgrade_attempt_count: Option<u32>,
    pub last_upgrade_version: Option<Option<String>>,
    pub last_upgrade_at_ms: Option<Option<u64>>,
}

macro_rules! assign_fields {
    ($update:expr, $agent:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = &$update.$field {
                $agent.$field = value.clone();
            }
        )*
    };
}

macro_rules! drop_unchanged {
    ($update:expr, $agent:expr, [$($field:ident),* $(,)?]) => {
        $(
            if $update.$field.as_ref() == Some(&$agent.$field) {
                $update.$field = None;
            }
        )*
    };
}

impl AgentUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write every set field onto `agent`. Index and update time are the
    /// store's business and are left alone.
    pub fn apply_to(&self, agent: &mut Agent) {
        assign_fields!(
            self,
            agent,
            [
                enrollment_key,
                session_id,
                session_expires_at_ms,
                status,
                last_status_change_ms,
                explicit_pools,
                dynamic_pools,
                properties,
                resources,
                leases,
                enabled,
                ephemeral,
                deleted,
                comment,
                request_conform,
                request_full_conform,
                request_restart,
                request_shutdown,
                request_force_restart,
                last_shutdown_reason,
                conform_attempt_count,
                last_conform_at_ms,
                upgrade_attempt_count,
                last_upgrade_version,
                last_upgrade_at_ms,
            ]
        );
    }

    /// Clear every field whose value already equals the one on `agent`.
    ///
    /// A delta that reduces to empty means the write can be skipped.
    pub fn without_unchanged(mut self, agent: &Agent) -> Self {
        drop_unchanged!(
            self,
            agent,
            [
                enrollment_key,
                session_id,
                session_expires_at_ms,
                status,
                last_status_change_ms,
                explicit_pools,
                dynamic_pools,
                properties,
                resources,
                leases,
                enabled,
                ephemeral,
                deleted,
                comment,
                request_conform,
                request_full_conform,
                request_restart,
                request_shutdown,
                request_force_restart,
                last_shutdown_reason,
                conform_attempt_count,
                last_conform_at_ms,
                upgrade_attempt_count,
                last_upgrade_version,
                last_upgrade_at_ms,
            ]
        );
        self
    }

    /// Set the status, stamping the change time only when it differs from
    /// `current`.
    pub fn set_status(&mut self, current: &Agent, status: AgentStatus, now_ms: u64) {
        self.status = Some(status);
        if current.status != status {
            self.last_status_change_ms = Some(now_ms);
        }
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
