// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the daemon from starting or running
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to read pools file {path}: {source}")]
    PoolsRead { path: PathBuf, source: std::io::Error },
    #[error("invalid pools file {path}: {source}")]
    PoolsParse { path: PathBuf, source: toml::de::Error },
    #[error("failed to create log directory {path}: {source}")]
    LogDir { path: PathBuf, source: std::io::Error },
    #[error("failed to install log subscriber: {0}")]
    Logging(String),
    #[error(transparent)]
    Scheduler(#[from] dv_engine::SchedulerError),
    #[error(transparent)]
    Store(#[from] dv_storage::StoreError),
}
