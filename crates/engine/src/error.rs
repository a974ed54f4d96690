// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler error types

use dv_adapters::{PoolSourceError, SessionStoreError};
use dv_core::{AgentId, LeaseId};
use dv_storage::StoreError;
use thiserror::Error;

/// Errors surfaced to callers of the scheduler.
///
/// Write conflicts never appear here; they are retried internally. Work
/// provider faults never appear either; they count as "no lease".
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),
    #[error("agent {0} was removed during the operation")]
    AgentVanished(AgentId),
    #[error("invalid session for agent {agent}: {reason}")]
    InvalidSession { agent: AgentId, reason: String },
    #[error("enrollment key does not match agent {0}")]
    EnrollmentMismatch(AgentId),
    #[error("lease not found: {0}")]
    LeaseNotFound(LeaseId),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Sessions(#[from] SessionStoreError),
    #[error(transparent)]
    Pools(#[from] PoolSourceError),
}

impl From<StoreError> for SchedulerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => SchedulerError::AgentVanished(id),
            other => SchedulerError::Store(other),
        }
    }
}
