// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled downtime.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether the farm is currently inside a scheduled downtime window.
/// Providers that do not allow downtime are skipped while it is active.
#[async_trait]
pub trait DowntimeSource: Send + Sync + 'static {
    async fn is_active(&self) -> bool;
}

/// Manually toggled downtime switch.
#[derive(Clone, Default)]
pub struct DowntimeFlag {
    active: Arc<AtomicBool>,
}

impl DowntimeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

#[async_trait]
impl DowntimeSource for DowntimeFlag {
    async fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
