// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `shed stop`

use crate::client;
use shed_daemon::DaemonPaths;

pub async fn handle(paths: &DaemonPaths) -> anyhow::Result<()> {
    if client::daemon_stop(paths).await? {
        println!("Daemon stopped");
    } else {
        println!("Daemon not running");
    }
    Ok(())
}
