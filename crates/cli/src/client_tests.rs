// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for daemon client behavior.

use super::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn paths_in(dir: &Path) -> DaemonPaths {
    DaemonPaths::under(&dir.join("state"), &dir.join("sock"), Path::new("/etc/shed.toml"))
}

/// connect() must not touch daemon files; only `stop` cleans up.
#[test]
fn connect_does_not_delete_pid_file() {
    let temp = tempdir().unwrap();
    let paths = paths_in(temp.path());

    fs::create_dir_all(paths.lock_path.parent().unwrap()).unwrap();
    fs::write(&paths.lock_path, "12345\n").unwrap();

    let result = DaemonClient::connect(&paths);
    assert!(matches!(result, Err(ClientError::DaemonNotRunning)));
    assert!(paths.lock_path.exists(), "connect() must not delete pid file");
}

#[tokio::test]
async fn stop_without_daemon_cleans_stale_pid() {
    let temp = tempdir().unwrap();
    let paths = paths_in(temp.path());

    fs::create_dir_all(paths.lock_path.parent().unwrap()).unwrap();
    fs::write(&paths.lock_path, "12345\n").unwrap();

    let stopped = daemon_stop(&paths).await.unwrap();
    assert!(!stopped);
    assert!(!paths.lock_path.exists());
}

#[test]
fn pid_file_is_parsed() {
    let temp = tempdir().unwrap();
    let paths = paths_in(temp.path());
    assert_eq!(read_daemon_pid(&paths), None);

    fs::create_dir_all(paths.lock_path.parent().unwrap()).unwrap();
    fs::write(&paths.lock_path, "4242\n").unwrap();
    assert_eq!(read_daemon_pid(&paths), Some(4242));

    fs::write(&paths.lock_path, "garbage").unwrap();
    assert_eq!(read_daemon_pid(&paths), None);
}

#[tokio::test]
async fn status_over_socket() {
    let temp = tempdir().unwrap();
    let paths = paths_in(temp.path());
    fs::create_dir_all(paths.socket_path.parent().unwrap()).unwrap();
    let listener = tokio::net::UnixListener::bind(&paths.socket_path).unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (mut reader, mut writer) = stream.into_split();
        let request = protocol::read_request(&mut reader, protocol::DEFAULT_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(request, Request::Status);
        let response = Response::Status {
            uptime_secs: 12,
            replica_id: "pod-a".to_string(),
            version: "0.1.0".to_string(),
            tasks: vec![],
        };
        protocol::write_response(&mut writer, &response, protocol::DEFAULT_TIMEOUT)
            .await
            .unwrap();
    });

    let client = DaemonClient::connect(&paths).unwrap();
    let status = client.status().await.unwrap();
    server.await.unwrap();

    assert_eq!(status.uptime_secs, 12);
    assert_eq!(status.replica_id, "pod-a");
    assert!(status.tasks.is_empty());
}

#[tokio::test]
async fn error_response_is_rejected() {
    let temp = tempdir().unwrap();
    let paths = paths_in(temp.path());
    fs::create_dir_all(paths.socket_path.parent().unwrap()).unwrap();
    let listener = tokio::net::UnixListener::bind(&paths.socket_path).unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (mut reader, mut writer) = stream.into_split();
        let _ = protocol::read_request(&mut reader, protocol::DEFAULT_TIMEOUT).await;
        let response = Response::Error {
            message: "store unavailable".to_string(),
        };
        protocol::write_response(&mut writer, &response, protocol::DEFAULT_TIMEOUT)
            .await
            .unwrap();
    });

    let client = DaemonClient::connect(&paths).unwrap();
    let err = client.locks().await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, ClientError::Rejected(message) if message == "store unavailable"));
}
