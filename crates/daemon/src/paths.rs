// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-config daemon file locations

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the socket directory (tests use a tempdir)
pub const SOCKET_DIR_ENV: &str = "SHED_SOCKET_DIR";

#[derive(Debug, Error)]
#[error("could not determine state directory (set XDG_STATE_HOME or HOME)")]
pub struct NoStateDir;

/// Files owned by one daemon instance.
///
/// One daemon per config file: the directory name is a hash of the
/// config's canonical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonPaths {
    pub socket_path: PathBuf,
    /// Lock/PID file
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
}

impl DaemonPaths {
    pub fn for_config(config_path: &Path) -> Result<Self, NoStateDir> {
        Ok(Self::under(&state_dir()?, &socket_dir(), config_path))
    }

    /// Layout rooted at explicit directories
    pub fn under(state_dir: &Path, socket_dir: &Path, config_path: &Path) -> Self {
        let hash = config_hash(config_path);
        let dir = state_dir.join(&hash);
        Self {
            socket_path: socket_dir.join(format!("{}.sock", hash)),
            lock_path: dir.join("daemon.pid"),
            version_path: dir.join("daemon.version"),
            log_path: dir.join("daemon.log"),
        }
    }
}

/// `$XDG_STATE_HOME/shed`, else `~/.local/state/shed`
pub fn state_dir() -> Result<PathBuf, NoStateDir> {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("shed"));
    }
    let home = std::env::var("HOME").map_err(|_| NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/shed"))
}

/// `/tmp/shed` keeps socket paths short (macOS SUN_LEN = 104)
pub fn socket_dir() -> PathBuf {
    std::env::var_os(SOCKET_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp/shed"))
}

fn config_hash(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let result = hasher.finalize();
    hex_encode(&result[..8])
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
