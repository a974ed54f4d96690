// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dv_core::AgentId;
use thiserror::Error;

/// Errors from the agent record store.
///
/// A lost conditional write is not an error: it surfaces as `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("agent not found: {0}")]
    NotFound(AgentId),
    #[error("store backend error: {0}")]
    Backend(String),
}
