// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);

/// Timing and batching knobs for [`crate::LeaseScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Lifetime granted to a new or renewed session
    pub session_lifetime: Duration,
    /// Renew only once the prior expiry is this close
    pub renewal_window: Duration,
    /// Long-polls end this long before the session would expire
    pub expiry_margin: Duration,
    /// Added back onto the long-poll budget
    pub long_poll_extension: Duration,
    pub maintenance_interval: Duration,
    pub expired_batch_size: usize,
    /// How long a deleted ephemeral agent lingers before hard deletion
    pub ephemeral_grace: Duration,
    pub pool_cache_ttl: Duration,
    pub lease_index_ttl: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            session_lifetime: 5 * MINUTE,
            renewal_window: 4 * MINUTE,
            expiry_margin: 4 * MINUTE,
            long_poll_extension: Duration::ZERO,
            maintenance_interval: Duration::from_secs(30),
            expired_batch_size: 100,
            ephemeral_grace: 7 * 24 * 60 * MINUTE,
            pool_cache_ttl: Duration::from_secs(30),
            lease_index_ttl: 60 * MINUTE,
        }
    }
}

impl SchedulerConfig {
    /// Epoch ms at which a long-poll against a session expiring at
    /// `expires_at_ms` must return.
    pub fn wait_deadline_ms(&self, expires_at_ms: u64) -> u64 {
        expires_at_ms
            .saturating_sub(self.expiry_margin.as_millis() as u64)
            .saturating_add(self.long_poll_extension.as_millis() as u64)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
