// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler configuration file
//!
//! ```toml
//! [scheduler]
//! store_dir = "/shared/shed"
//!
//! [task.cluster-report]
//! cron = "0 * * * * *"
//! min_hold = "15s"
//! max_hold = "50s"
//! run = "echo hello"
//! ```

use serde::Deserialize;
use shed_core::{HoldPolicy, HolderId, Job, PolicyError, TaskDef, Trigger, TriggerError};
use shed_engine::{CommandJob, SleepJob, DEFAULT_POLL_INTERVAL, DEFAULT_WRITE_TIMEOUT};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "SHED_CONFIG";

/// Config file used when neither an argument nor `SHED_CONFIG` is given
pub const DEFAULT_CONFIG_FILE: &str = "shed.toml";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("task '{0}': set exactly one of `cron` or `every`")]
    Trigger(String),
    #[error("task '{task}': {source}")]
    InvalidTrigger {
        task: String,
        #[source]
        source: TriggerError,
    },
    #[error("task '{task}': {source}")]
    InvalidHold {
        task: String,
        #[source]
        source: PolicyError,
    },
    #[error("task '{0}': set exactly one of `run` or `sleep`")]
    Body(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    scheduler: RawScheduler,
    #[serde(default)]
    task: BTreeMap<String, RawTask>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScheduler {
    replica_id: Option<String>,
    store_dir: PathBuf,
    #[serde(default, with = "humantime_serde")]
    poll_interval: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    history_write_timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTask {
    cron: Option<String>,
    #[serde(default, with = "humantime_serde")]
    every: Option<Duration>,
    lock: Option<String>,
    #[serde(default, with = "humantime_serde")]
    min_hold: Option<Duration>,
    #[serde(with = "humantime_serde")]
    max_hold: Duration,
    #[serde(default)]
    release_early: bool,
    run: Option<String>,
    #[serde(default, with = "humantime_serde")]
    sleep: Option<Duration>,
}

/// Replica-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub replica_id: Option<String>,
    /// Directory shared by every replica; holds the lock table and history log
    pub store_dir: PathBuf,
    pub poll_interval: Duration,
    pub history_write_timeout: Duration,
}

/// What a task runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobBody {
    Command(String),
    Sleep(Duration),
}

impl JobBody {
    pub fn to_job(&self) -> Arc<dyn Job> {
        match self {
            JobBody::Command(command) => Arc::new(CommandJob::new(command.clone())),
            JobBody::Sleep(duration) => Arc::new(SleepJob::new(*duration)),
        }
    }
}

impl std::fmt::Display for JobBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobBody::Command(command) => write!(f, "run `{}`", command),
            JobBody::Sleep(duration) => write!(f, "sleep {:?}", duration),
        }
    }
}

/// A configured task and its body
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub def: TaskDef,
    pub body: JobBody,
}

/// Parsed configuration file
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical path of the file this was loaded from
    pub path: PathBuf,
    pub scheduler: SchedulerConfig,
    /// Tasks ordered by name
    pub tasks: Vec<TaskConfig>,
}

impl Config {
    /// Pick the config path: explicit argument, then `SHED_CONFIG`, then `./shed.toml`
    pub fn resolve_path(arg: Option<PathBuf>) -> PathBuf {
        arg.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let read_err = |source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };
        let canonical = path.canonicalize().map_err(read_err)?;
        let content = std::fs::read_to_string(&canonical).map_err(read_err)?;
        Self::parse(&content, &canonical)
    }

    /// Parse `content` as if read from `path`; a relative `store_dir` is
    /// resolved against the file's directory.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let store_dir = if raw.scheduler.store_dir.is_absolute() {
            raw.scheduler.store_dir
        } else {
            base.join(raw.scheduler.store_dir)
        };
        let scheduler = SchedulerConfig {
            replica_id: raw.scheduler.replica_id.filter(|id| !id.trim().is_empty()),
            store_dir,
            poll_interval: raw.scheduler.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            history_write_timeout: raw
                .scheduler
                .history_write_timeout
                .unwrap_or(DEFAULT_WRITE_TIMEOUT),
        };

        let tasks = raw
            .task
            .into_iter()
            .map(|(name, task)| parse_task(name, task))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            scheduler,
            tasks,
        })
    }

    /// Replica identity: configured id, else detected from the environment
    pub fn replica_id(&self) -> HolderId {
        match &self.scheduler.replica_id {
            Some(id) => HolderId::new(id.trim()),
            None => HolderId::detect(),
        }
    }
}

fn parse_task(name: String, raw: RawTask) -> Result<TaskConfig, ConfigError> {
    let trigger = match (raw.cron, raw.every) {
        (Some(expr), None) => Trigger::cron(&expr),
        (None, Some(interval)) => Trigger::every(interval),
        _ => return Err(ConfigError::Trigger(name)),
    }
    .map_err(|source| ConfigError::InvalidTrigger {
        task: name.clone(),
        source,
    })?;

    let hold = HoldPolicy::new(raw.min_hold.unwrap_or(Duration::ZERO), raw.max_hold).map_err(
        |source| ConfigError::InvalidHold {
            task: name.clone(),
            source,
        },
    )?;

    let body = match (raw.run, raw.sleep) {
        (Some(command), None) => JobBody::Command(command),
        (None, Some(duration)) => JobBody::Sleep(duration),
        _ => return Err(ConfigError::Body(name)),
    };

    let mut def = TaskDef::new(name, trigger, hold).with_release_early(raw.release_early);
    if let Some(lock) = raw.lock {
        def = def.with_lock_name(lock);
    }
    Ok(TaskConfig { def, body })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
