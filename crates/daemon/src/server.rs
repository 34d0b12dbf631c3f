// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use shed_daemon::protocol::{
    self, select_history, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION,
};
use shed_daemon::TaskSummary;
use shed_storage::{HistoryStore, LockStore};
use tokio::net::UnixStream;
use tracing::{debug, error};

use crate::lifecycle::DaemonState;

/// Handle a single client connection
pub async fn handle_connection(
    daemon: &mut DaemonState,
    stream: UnixStream,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    let response = handle_request(daemon, request).await;

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

async fn handle_request(daemon: &mut DaemonState, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Status => {
            let tasks = daemon
                .scheduler
                .as_ref()
                .map(|s| s.tasks().into_iter().map(TaskSummary::from).collect())
                .unwrap_or_default();
            Response::Status {
                uptime_secs: daemon.start_time.elapsed().as_secs(),
                replica_id: daemon.holder.to_string(),
                version: PROTOCOL_VERSION.to_string(),
                tasks,
            }
        }

        Request::Locks => match daemon.locks.list().await {
            Ok(locks) => Response::Locks { locks },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::History { job, limit } => match daemon.history.list().await {
            Ok(entries) => Response::History {
                entries: select_history(entries, job.as_deref(), limit),
            },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::Shutdown => {
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}
