// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque tagged lease payloads.
//!
//! The scheduler only ever looks at [`LeasePayload::type_tag`]; the bytes
//! belong to the work provider that produced them. The two maintenance
//! payloads below are the exception, decoded for diagnostic counters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from decoding a built-in payload
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload has type '{actual}', expected '{expected}'")]
    WrongType { expected: &'static str, actual: String },
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Work description attached to a lease: a type discriminator plus bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeasePayload {
    pub type_tag: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl LeasePayload {
    pub fn new(type_tag: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self { type_tag: type_tag.into(), data: data.into() }
    }

    pub fn is(&self, type_tag: &str) -> bool {
        self.type_tag == type_tag
    }
}

/// Resynchronize the agent's workspaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformPayload {
    /// Wipe and resync everything rather than only what changed
    #[serde(default)]
    pub full: bool,
}

/// Install a different agent software version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePayload {
    pub version: String,
}

macro_rules! builtin_payload {
    ($ty:ty, $tag:literal) => {
        impl $ty {
            pub const TYPE_TAG: &'static str = $tag;

            pub fn encode(&self) -> Result<LeasePayload, PayloadError> {
                Ok(LeasePayload::new(Self::TYPE_TAG, serde_json::to_vec(self)?))
            }

            pub fn decode(payload: &LeasePayload) -> Result<Self, PayloadError> {
                if !payload.is(Self::TYPE_TAG) {
                    return Err(PayloadError::WrongType {
                        expected: Self::TYPE_TAG,
                        actual: payload.type_tag.clone(),
                    });
                }
                Ok(serde_json::from_slice(&payload.data)?)
            }
        }
    };
}

builtin_payload!(ConformPayload, "conform");
builtin_payload!(UpgradePayload, "upgrade");

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
