// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Half-open range of epoch milliseconds, `[after_ms, before_ms)`.
/// Unset bounds are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub after_ms: Option<u64>,
    pub before_ms: Option<u64>,
}

impl TimeWindow {
    pub fn between(after_ms: u64, before_ms: u64) -> Self {
        Self { after_ms: Some(after_ms), before_ms: Some(before_ms) }
    }

    pub fn contains(&self, at_ms: u64) -> bool {
        self.after_ms.is_none_or(|a| at_ms >= a) && self.before_ms.is_none_or(|b| at_ms < b)
    }
}
