// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

const VARS: &[&str] = &[
    "DV_LOG",
    "DV_LOG_DIR",
    "DV_POOLS_FILE",
    "DV_SESSION_LIFETIME_MS",
    "DV_RENEWAL_WINDOW_MS",
    "DV_EXPIRY_MARGIN_MS",
    "DV_LONG_POLL_EXTENSION_MS",
    "DV_MAINTENANCE_INTERVAL_MS",
    "DV_EXPIRED_BATCH_SIZE",
    "DV_EPHEMERAL_GRACE_MS",
    "DV_POOL_CACHE_TTL_MS",
    "DV_LEASE_INDEX_TTL_MS",
];

fn clear() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_without_overrides() {
    clear();
    assert_eq!(scheduler_config(), SchedulerConfig::default());
    assert_eq!(log_filter(), "info");
    assert_eq!(log_dir(), None);
    assert_eq!(pools_file(), None);
}

#[test]
#[serial]
fn millisecond_overrides() {
    clear();
    std::env::set_var("DV_SESSION_LIFETIME_MS", "60000");
    std::env::set_var("DV_EXPIRY_MARGIN_MS", "10000");
    std::env::set_var("DV_EXPIRED_BATCH_SIZE", "25");
    std::env::set_var("DV_LOG", "dv_engine=debug");

    let config = scheduler_config();
    assert_eq!(config.session_lifetime, Duration::from_secs(60));
    assert_eq!(config.expiry_margin, Duration::from_secs(10));
    assert_eq!(config.expired_batch_size, 25);
    assert_eq!(config.renewal_window, SchedulerConfig::default().renewal_window);
    assert_eq!(log_filter(), "dv_engine=debug");
    clear();
}

#[yare::parameterized(
    not_a_number = { "soon" },
    negative     = { "-5" },
    empty        = { "" },
)]
#[serial]
fn unparseable_values_fall_back(value: &str) {
    clear();
    std::env::set_var("DV_MAINTENANCE_INTERVAL_MS", value);
    std::env::set_var("DV_EXPIRED_BATCH_SIZE", value);
    let config = scheduler_config();
    assert_eq!(config.maintenance_interval, Duration::from_secs(30));
    assert_eq!(config.expired_batch_size, 100);
    clear();
}

#[test]
#[serial]
fn zero_batch_size_is_ignored() {
    clear();
    std::env::set_var("DV_EXPIRED_BATCH_SIZE", "0");
    assert_eq!(scheduler_config().expired_batch_size, 100);
    clear();
}
