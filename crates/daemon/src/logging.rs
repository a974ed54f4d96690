// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::DaemonError;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "dvd.log";

/// Install the global subscriber. With `log_dir` set, output goes to a
/// daily-rotated file through a non-blocking writer whose guard must be
/// held until exit; otherwise to stderr.
pub fn init_logging(filter: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, DaemonError> {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| DaemonError::LogDir { path: dir.to_path_buf(), source })?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
            builder.with_ansi(false).with_writer(writer).try_init().map_err(|e| DaemonError::Logging(e.to_string()))?;
            Ok(Some(guard))
        }
        None => {
            builder.with_writer(std::io::stderr).try_init().map_err(|e| DaemonError::Logging(e.to_string()))?;
            Ok(None)
        }
    }
}
