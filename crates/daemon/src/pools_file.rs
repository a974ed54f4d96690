// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool configuration file.
//!
//! ```toml
//! [[pool]]
//! id = "linux"
//! condition = "OSFamily == 'Linux'"
//! ```

use crate::error::DaemonError;
use dv_core::Pool;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PoolsFile {
    #[serde(default)]
    pool: Vec<Pool>,
}

/// Parse pool definitions; `path` is only used in error messages. A pool
/// without a display name takes its id.
pub fn parse_pools(path: &Path, text: &str) -> Result<Vec<Pool>, DaemonError> {
    let file: PoolsFile =
        toml::from_str(text).map_err(|source| DaemonError::PoolsParse { path: path.to_path_buf(), source })?;
    Ok(file
        .pool
        .into_iter()
        .map(|mut pool| {
            if pool.name.is_empty() {
                pool.name = pool.id.to_string();
            }
            pool
        })
        .collect())
}

pub fn load_pools(path: &Path) -> Result<Vec<Pool>, DaemonError> {
    let text =
        std::fs::read_to_string(path).map_err(|source| DaemonError::PoolsRead { path: path.to_path_buf(), source })?;
    let pools = parse_pools(path, &text)?;
    tracing::info!(path = %path.display(), pools = pools.len(), "loaded pool configuration");
    Ok(pools)
}

#[cfg(test)]
#[path = "pools_file_tests.rs"]
mod tests;
