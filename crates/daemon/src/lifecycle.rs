// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::File;
use std::time::Instant;

use fs2::FileExt;
use shed_core::{HolderId, JobStatus, SystemClock};
use shed_daemon::config::ConfigError;
use shed_daemon::paths::NoStateDir;
use shed_daemon::{Config, DaemonPaths};
use shed_engine::{
    Coordinator, HistoryRecorder, LockManager, RunningScheduler, SchedulerService, ServiceError,
};
use shed_storage::{
    FileHistoryStore, FileLockStore, HistoryStore, StoreError, TracedHistoryStore,
    TracedLockStore,
};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

pub type DaemonLocks = TracedLockStore<FileLockStore>;
pub type DaemonHistory = TracedHistoryStore<FileHistoryStore>;

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    pub paths: DaemonPaths,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub listener: UnixListener,
    /// Handles onto the shared stores, for queries
    pub locks: DaemonLocks,
    pub history: DaemonHistory,
    pub holder: HolderId,
    /// Taken on shutdown
    pub scheduler: Option<RunningScheduler>,
    pub start_time: Instant,
    pub shutdown_requested: bool,
}

impl DaemonState {
    /// Stop the scheduler, then remove the daemon's files
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon for config: {}", self.config.path.display());

        // Interrupted runs record their failure before we return
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop().await?;
        }

        for (path, what) in [
            (&self.paths.socket_path, "socket"),
            (&self.paths.lock_path, "PID"),
            (&self.paths.version_path, "version"),
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {} file: {}", what, e);
                }
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    NoStateDir(#[from] NoStateDir),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(std::path::PathBuf, std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: Config, paths: DaemonPaths) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config, &paths).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // The files belong to the daemon already holding the lock
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&paths);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: Config, paths: &DaemonPaths) -> Result<DaemonState, LifecycleError> {
    // 1. Create directories
    if let Some(parent) = paths.lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = paths.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire lock file FIRST - prevents two daemons for one config
    let mut lock_file = File::create(&paths.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    writeln!(lock_file, "{}", std::process::id())?;

    std::fs::write(&paths.version_path, env!("CARGO_PKG_VERSION"))?;

    // 3. Open the shared stores
    let store_dir = &config.scheduler.store_dir;
    let locks = TracedLockStore::new(FileLockStore::open(store_dir)?);
    let history = TracedHistoryStore::new(FileHistoryStore::open(store_dir)?);
    let holder = config.replica_id();

    info!(
        replica = %holder,
        store = %store_dir.display(),
        tasks = config.tasks.len(),
        "Loaded configuration"
    );

    // 4. Reconcile with reality (log warnings only)
    reconcile_history(&history, &holder).await;

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if paths.socket_path.exists() {
        std::fs::remove_file(&paths.socket_path)?;
    }
    let listener = UnixListener::bind(&paths.socket_path)
        .map_err(|e| LifecycleError::BindFailed(paths.socket_path.clone(), e))?;

    // 6. Register tasks and start firing
    let clock = SystemClock;
    let recorder = HistoryRecorder::new(history.clone(), clock.clone())
        .with_write_timeout(config.scheduler.history_write_timeout);
    let coordinator = Coordinator::new(
        LockManager::new(locks.clone(), clock.clone()),
        recorder,
        holder.clone(),
        clock.clone(),
    );
    let mut service =
        SchedulerService::new(coordinator, clock).with_poll_interval(config.scheduler.poll_interval);
    for task in &config.tasks {
        service.register(task.def.clone(), task.body.to_job())?;
    }
    if config.tasks.is_empty() {
        warn!("No tasks configured in {}", config.path.display());
    }
    let scheduler = service.start();

    info!("Daemon started for config: {}", config.path.display());

    Ok(DaemonState {
        config,
        paths: paths.clone(),
        lock_file,
        listener,
        locks,
        history,
        holder,
        scheduler: Some(scheduler),
        start_time: Instant::now(),
        shutdown_requested: false,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(paths: &DaemonPaths) {
    for path in [&paths.socket_path, &paths.version_path, &paths.lock_path] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Warn about runs this replica left RUNNING when it last stopped.
/// They are left as-is; their outcome is unknown.
async fn reconcile_history<H: HistoryStore>(history: &H, holder: &HolderId) {
    let entries = match history.list().await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not read job history: {}", e);
            return;
        }
    };

    let orphaned: Vec<_> = entries
        .iter()
        .filter(|e| e.status == JobStatus::Running && &e.executed_by == holder)
        .collect();

    if !orphaned.is_empty() {
        warn!(
            "Found {} runs left RUNNING by this replica (previous process exited mid-run)",
            orphaned.len()
        );
        for e in &orphaned {
            warn!("  - {} ({}): started {}", e.id, e.job_name, e.start_time);
        }
    }
}
