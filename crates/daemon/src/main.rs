// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drover daemon (dvd)

use dv_daemon::{env, init_logging, load_pools, Daemon, DaemonError};

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let _log_guard = init_logging(&env::log_filter(), env::log_dir().as_deref())?;

    let config = env::scheduler_config();
    let pools = match env::pools_file() {
        Some(path) => load_pools(&path)?,
        None => Vec::new(),
    };
    tracing::debug!(?config, "scheduler configuration");

    let daemon = Daemon::build(config, pools);
    daemon
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await
}
