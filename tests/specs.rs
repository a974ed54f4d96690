// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level behavioral specs for the Drover scheduler.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/scheduler"]
mod scheduler {
    mod expiry;
    mod long_poll;
    mod registration;
    mod settings;
}
