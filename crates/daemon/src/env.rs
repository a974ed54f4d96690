// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use dv_engine::SchedulerConfig;
use std::path::PathBuf;
use std::time::Duration;

fn duration_ms(name: &str) -> Option<Duration> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Log filter directives (default `info`)
pub fn log_filter() -> String {
    std::env::var("DV_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "info".to_string())
}

/// Directory for daily-rotated log files. Logs go to stderr when unset.
pub fn log_dir() -> Option<PathBuf> {
    std::env::var("DV_LOG_DIR").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// TOML file describing the configured pools
pub fn pools_file() -> Option<PathBuf> {
    std::env::var("DV_POOLS_FILE").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Scheduler defaults with any `DV_*_MS` overrides applied. Unparseable
/// values are ignored.
pub fn scheduler_config() -> SchedulerConfig {
    let defaults = SchedulerConfig::default();
    SchedulerConfig {
        session_lifetime: duration_ms("DV_SESSION_LIFETIME_MS").unwrap_or(defaults.session_lifetime),
        renewal_window: duration_ms("DV_RENEWAL_WINDOW_MS").unwrap_or(defaults.renewal_window),
        expiry_margin: duration_ms("DV_EXPIRY_MARGIN_MS").unwrap_or(defaults.expiry_margin),
        long_poll_extension: duration_ms("DV_LONG_POLL_EXTENSION_MS").unwrap_or(defaults.long_poll_extension),
        maintenance_interval: duration_ms("DV_MAINTENANCE_INTERVAL_MS").unwrap_or(defaults.maintenance_interval),
        expired_batch_size: std::env::var("DV_EXPIRED_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.expired_batch_size),
        ephemeral_grace: duration_ms("DV_EPHEMERAL_GRACE_MS").unwrap_or(defaults.ephemeral_grace),
        pool_cache_ttl: duration_ms("DV_POOL_CACHE_TTL_MS").unwrap_or(defaults.pool_cache_ttl),
        lease_index_ttl: duration_ms("DV_LEASE_INDEX_TTL_MS").unwrap_or(defaults.lease_index_ttl),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
