// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod check;
pub mod history;
pub mod locks;
pub mod status;
pub mod stop;

use crate::client::{ClientError, DaemonClient};
use shed_daemon::DaemonPaths;
use shed_storage::StoreError;
use std::future::Future;

/// Ask the running daemon; read the shared store directly when none is
/// running on this host.
pub async fn daemon_or_store<T, D, DF, S, SF>(
    paths: &DaemonPaths,
    ask: D,
    read: S,
) -> anyhow::Result<T>
where
    D: FnOnce(DaemonClient) -> DF,
    DF: Future<Output = Result<T, ClientError>>,
    S: FnOnce() -> SF,
    SF: Future<Output = Result<T, StoreError>>,
{
    let answer = match DaemonClient::connect(paths) {
        Ok(client) => ask(client).await,
        Err(e) => Err(e),
    };
    match answer {
        Ok(value) => Ok(value),
        Err(ClientError::DaemonNotRunning) => Ok(read().await?),
        Err(e) => Err(e.into()),
    }
}
