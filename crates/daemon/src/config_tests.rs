// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const FULL: &str = r#"
[scheduler]
replica_id = "pod-a"
store_dir = "/shared/shed"
poll_interval = "500ms"
history_write_timeout = "2s"

[task.cluster-report]
cron = "0 * * * * *"
lock = "ClusterAwareScheduledTask_run"
min_hold = "15s"
max_hold = "50s"
run = "echo hello"

[task.warmup]
every = "30s"
max_hold = "10s"
release_early = true
sleep = "1s"
"#;

fn parse(content: &str) -> Result<Config, ConfigError> {
    Config::parse(content, Path::new("/etc/shed/shed.toml"))
}

#[test]
fn full_config_parses() {
    let config = parse(FULL).unwrap();

    assert_eq!(config.scheduler.replica_id.as_deref(), Some("pod-a"));
    assert_eq!(config.scheduler.store_dir, PathBuf::from("/shared/shed"));
    assert_eq!(config.scheduler.poll_interval, Duration::from_millis(500));
    assert_eq!(config.scheduler.history_write_timeout, Duration::from_secs(2));
    assert_eq!(config.replica_id(), HolderId::new("pod-a"));

    assert_eq!(config.tasks.len(), 2);
    let report = &config.tasks[0];
    assert_eq!(report.def.name, "cluster-report");
    assert_eq!(report.def.lock_name, "ClusterAwareScheduledTask_run");
    assert_eq!(report.def.min_hold(), Duration::from_secs(15));
    assert_eq!(report.def.max_hold(), Duration::from_secs(50));
    assert!(!report.def.release_early);
    assert_eq!(report.body, JobBody::Command("echo hello".to_string()));

    let warmup = &config.tasks[1];
    assert_eq!(warmup.def.lock_name, "warmup");
    assert_eq!(warmup.def.min_hold(), Duration::ZERO);
    assert!(warmup.def.release_early);
    assert_eq!(warmup.body, JobBody::Sleep(Duration::from_secs(1)));
}

#[test]
fn defaults_apply() {
    let config = parse("[scheduler]\nstore_dir = \"/shared\"\n").unwrap();

    assert!(config.tasks.is_empty());
    assert_eq!(config.scheduler.replica_id, None);
    assert_eq!(config.scheduler.poll_interval, DEFAULT_POLL_INTERVAL);
    assert_eq!(config.scheduler.history_write_timeout, DEFAULT_WRITE_TIMEOUT);
}

#[test]
fn relative_store_dir_is_resolved_against_config_dir() {
    let config = parse("[scheduler]\nstore_dir = \"state\"\n").unwrap();
    assert_eq!(config.scheduler.store_dir, PathBuf::from("/etc/shed/state"));
}

#[parameterized(
    no_trigger = { "max_hold = \"10s\"\nrun = \"true\"" },
    both_triggers = { "cron = \"0 * * * * *\"\nevery = \"1s\"\nmax_hold = \"10s\"\nrun = \"true\"" },
)]
fn trigger_must_be_exactly_one(task: &str) {
    let content = format!("[scheduler]\nstore_dir = \"/s\"\n[task.report]\n{}\n", task);
    assert!(matches!(parse(&content), Err(ConfigError::Trigger(name)) if name == "report"));
}

#[parameterized(
    no_body = { "every = \"1s\"\nmax_hold = \"10s\"" },
    both_bodies = { "every = \"1s\"\nmax_hold = \"10s\"\nrun = \"true\"\nsleep = \"1s\"" },
)]
fn body_must_be_exactly_one(task: &str) {
    let content = format!("[scheduler]\nstore_dir = \"/s\"\n[task.report]\n{}\n", task);
    assert!(matches!(parse(&content), Err(ConfigError::Body(name)) if name == "report"));
}

#[test]
fn invalid_cron_is_rejected() {
    let content = "[scheduler]\nstore_dir = \"/s\"\n[task.report]\ncron = \"not cron\"\nmax_hold = \"10s\"\nrun = \"true\"\n";
    assert!(matches!(
        parse(content),
        Err(ConfigError::InvalidTrigger { .. })
    ));
}

#[test]
fn min_hold_above_max_hold_is_rejected() {
    let content = "[scheduler]\nstore_dir = \"/s\"\n[task.report]\nevery = \"1m\"\nmin_hold = \"1m\"\nmax_hold = \"10s\"\nrun = \"true\"\n";
    let err = parse(content).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidHold { .. }));
    assert!(err.to_string().starts_with("task 'report':"));
}

#[test]
fn unknown_keys_are_rejected() {
    let content = "[scheduler]\nstore_dir = \"/s\"\nstore = \"/t\"\n";
    assert!(matches!(parse(content), Err(ConfigError::Toml(_))));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shed.toml");
    std::fs::write(&path, "[scheduler]\nstore_dir = \"store\"\n").unwrap();

    let config = Config::load(&path).unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    assert_eq!(config.path, canonical.join("shed.toml"));
    assert_eq!(config.scheduler.store_dir, canonical.join("store"));
}

#[test]
fn load_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn explicit_path_wins() {
    let path = Config::resolve_path(Some(PathBuf::from("/tmp/custom.toml")));
    assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
}
