// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled task definitions

use crate::lock::HoldPolicy;
use crate::trigger::Trigger;
use std::time::Duration;

/// A cluster-wide scheduled task: what fires, which lock guards it, and for how long
#[derive(Debug, Clone)]
pub struct TaskDef {
    /// Logical job name, recorded in history
    pub name: String,
    /// Lock guarding each tick; defaults to the job name
    pub lock_name: String,
    pub trigger: Trigger,
    pub hold: HoldPolicy,
    /// Release the lock after the body finishes (never before `min_hold`)
    pub release_early: bool,
}

impl TaskDef {
    pub fn new(name: impl Into<String>, trigger: Trigger, hold: HoldPolicy) -> Self {
        let name = name.into();
        Self {
            lock_name: name.clone(),
            name,
            trigger,
            hold,
            release_early: false,
        }
    }

    pub fn with_lock_name(mut self, lock_name: impl Into<String>) -> Self {
        self.lock_name = lock_name.into();
        self
    }

    pub fn with_release_early(mut self, release_early: bool) -> Self {
        self.release_early = release_early;
        self
    }

    pub fn min_hold(&self) -> Duration {
        self.hold.min_hold
    }

    pub fn max_hold(&self) -> Duration {
        self.hold.max_hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold() -> HoldPolicy {
        HoldPolicy::new(Duration::from_secs(15), Duration::from_secs(50)).unwrap()
    }

    #[test]
    fn lock_name_defaults_to_task_name() {
        let trigger = Trigger::every(Duration::from_secs(60)).unwrap();
        let task = TaskDef::new("cluster-report", trigger, hold());

        assert_eq!(task.lock_name, "cluster-report");
        assert!(!task.release_early);
        assert_eq!(task.min_hold(), Duration::from_secs(15));
        assert_eq!(task.max_hold(), Duration::from_secs(50));
    }

    #[test]
    fn builders_override_defaults() {
        let trigger = Trigger::cron("0 * * * * *").unwrap();
        let task = TaskDef::new("cluster-report", trigger, hold())
            .with_lock_name("ClusterAwareScheduledTask_run")
            .with_release_early(true);

        assert_eq!(task.name, "cluster-report");
        assert_eq!(task.lock_name, "ClusterAwareScheduledTask_run");
        assert!(task.release_early);
    }
}
