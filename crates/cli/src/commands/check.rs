// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `shed check`: validate the config and preview firings without a daemon

use super::status::TaskLine;
use crate::output::{self, OutputFormat};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shed_daemon::{Config, TaskSummary};
use std::fmt;

#[derive(Serialize)]
struct CheckedTask {
    #[serde(flatten)]
    summary: TaskSummary,
    min_hold: String,
    max_hold: String,
    release_early: bool,
    body: String,
}

impl fmt::Display for CheckedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n    hold {}..{}{}  {}",
            TaskLine(&self.summary),
            self.min_hold,
            self.max_hold,
            if self.release_early { " (release early)" } else { "" },
            self.body
        )
    }
}

fn checked_tasks(config: &Config, now: DateTime<Utc>) -> Vec<CheckedTask> {
    config
        .tasks
        .iter()
        .map(|task| CheckedTask {
            summary: TaskSummary {
                name: task.def.name.clone(),
                lock_name: task.def.lock_name.clone(),
                trigger: task.def.trigger.to_string(),
                next_fire: task.def.trigger.next_after(now),
                running: false,
            },
            min_hold: format!("{:?}", task.def.min_hold()),
            max_hold: format!("{:?}", task.def.max_hold()),
            release_early: task.def.release_early,
            body: task.body.to_string(),
        })
        .collect()
}

pub fn handle(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let tasks = checked_tasks(config, Utc::now());
    if let OutputFormat::Text = format {
        println!("{}: ok", config.path.display());
        println!("  store: {}", config.scheduler.store_dir.display());
        println!("  replica: {}", config.replica_id());
    }
    output::print_list(&tasks, format, "  (no tasks)");
    Ok(())
}
