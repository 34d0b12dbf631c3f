// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-lifetime scheduler service
//!
//! Owns the registered tasks and a driver loop that fires them through the
//! [`Coordinator`]. Within one process a task never runs twice at once: a
//! tick that arrives while the previous run is still going is skipped.
//! Missed ticks are never backfilled; the next firing is always computed
//! from the current time.

use crate::coordinator::{Coordinator, TickOutcome};
use crate::error::{CoordinatorError, ServiceError};
use crate::scheduler::Scheduler;
use crate::shutdown::{self, Shutdown, ShutdownTrigger};
use chrono::{DateTime, Utc};
use shed_core::clock::duration_between;
use shed_core::{Clock, Job, TaskDef};
use shed_storage::{HistoryStore, LockStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};

/// Upper bound on how long the driver sleeps between checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Point-in-time view of a registered task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub name: String,
    pub lock_name: String,
    pub trigger: String,
    pub next_fire: Option<DateTime<Utc>>,
    pub running: bool,
}

struct RegisteredTask {
    def: TaskDef,
    job: Arc<dyn Job>,
}

/// Shared task table read by status queries
#[derive(Clone, Default)]
struct StatusBoard {
    tasks: Arc<Mutex<BTreeMap<String, TaskStatus>>>,
}

impl StatusBoard {
    fn with<T>(&self, f: impl FnOnce(&mut BTreeMap<String, TaskStatus>) -> T) -> T {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut tasks)
    }

    fn snapshot(&self) -> Vec<TaskStatus> {
        self.with(|tasks| tasks.values().cloned().collect())
    }

    fn set_next_fire(&self, name: &str, at: Option<DateTime<Utc>>) {
        self.with(|tasks| {
            if let Some(status) = tasks.get_mut(name) {
                status.next_fire = at;
            }
        });
    }

    /// Mark `name` running unless it already is
    fn try_begin(&self, name: &str) -> Option<RunGuard> {
        let started = self.with(|tasks| match tasks.get_mut(name) {
            Some(status) if !status.running => {
                status.running = true;
                true
            }
            _ => false,
        });
        started.then(|| RunGuard {
            board: self.clone(),
            name: name.to_string(),
        })
    }
}

/// Clears the running flag when the tick finishes, panics or is aborted
struct RunGuard {
    board: StatusBoard,
    name: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.board.with(|tasks| {
            if let Some(status) = tasks.get_mut(&self.name) {
                status.running = false;
            }
        });
    }
}

/// Registers tasks, then drives them until stopped
pub struct SchedulerService<L, H, C> {
    coordinator: Arc<Coordinator<L, H, C>>,
    clock: C,
    poll_interval: Duration,
    tasks: BTreeMap<String, RegisteredTask>,
}

impl<L, H, C> SchedulerService<L, H, C>
where
    L: LockStore,
    H: HistoryStore,
    C: Clock,
{
    pub fn new(coordinator: Coordinator<L, H, C>, clock: C) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            clock,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tasks: BTreeMap::new(),
        }
    }

    /// Cap the driver's sleep; zero falls back to the default
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        self
    }

    pub fn register(&mut self, def: TaskDef, job: Arc<dyn Job>) -> Result<(), ServiceError> {
        if self.tasks.contains_key(&def.name) {
            return Err(ServiceError::DuplicateTask(def.name));
        }
        tracing::info!(task = %def.name, lock = %def.lock_name, trigger = %def.trigger, "task registered");
        self.tasks.insert(def.name.clone(), RegisteredTask { def, job });
        Ok(())
    }

    pub fn task_names(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    /// Spawn the driver loop
    pub fn start(self) -> RunningScheduler {
        let (trigger, shutdown) = shutdown::channel();
        let board = StatusBoard::default();
        board.with(|statuses| {
            for task in self.tasks.values() {
                statuses.insert(
                    task.def.name.clone(),
                    TaskStatus {
                        name: task.def.name.clone(),
                        lock_name: task.def.lock_name.clone(),
                        trigger: task.def.trigger.to_string(),
                        next_fire: None,
                        running: false,
                    },
                );
            }
        });

        let driver = Driver {
            coordinator: self.coordinator,
            clock: self.clock,
            poll_interval: self.poll_interval,
            tasks: self.tasks,
            board: board.clone(),
        };
        let handle = tokio::spawn(driver.run(shutdown));
        tracing::info!("scheduler started");

        RunningScheduler {
            trigger,
            board,
            handle,
        }
    }
}

/// Handle to a started scheduler
pub struct RunningScheduler {
    trigger: ShutdownTrigger,
    board: StatusBoard,
    handle: JoinHandle<()>,
}

impl RunningScheduler {
    pub fn tasks(&self) -> Vec<TaskStatus> {
        self.board.snapshot()
    }

    /// Stop firing, interrupt running ticks and wait for them to record
    pub async fn stop(self) -> Result<(), ServiceError> {
        self.trigger.trigger();
        self.handle
            .await
            .map_err(|e| ServiceError::Driver(e.to_string()))?;
        tracing::info!("scheduler stopped");
        Ok(())
    }
}

type TickResult = (String, Result<TickOutcome, CoordinatorError>);

struct Driver<L, H, C> {
    coordinator: Arc<Coordinator<L, H, C>>,
    clock: C,
    poll_interval: Duration,
    tasks: BTreeMap<String, RegisteredTask>,
    board: StatusBoard,
}

impl<L, H, C> Driver<L, H, C>
where
    L: LockStore,
    H: HistoryStore,
    C: Clock,
{
    async fn run(self, shutdown: Shutdown) {
        let mut timers = Scheduler::new();
        let now = self.clock.now();
        for name in self.tasks.keys() {
            self.schedule_next(&mut timers, name, now);
        }

        let mut ticks: JoinSet<TickResult> = JoinSet::new();
        loop {
            let now = self.clock.now();
            for item in timers.poll(now) {
                self.schedule_next(&mut timers, &item.task, now);
                self.fire(&mut ticks, &item.task, &shutdown);
            }

            let sleep_for = timers
                .next_fire_time()
                .map_or(self.poll_interval, |at| duration_between(now, at))
                .min(self.poll_interval);

            tokio::select! {
                () = tokio::time::sleep(sleep_for) => {}
                Some(joined) = ticks.join_next() => log_tick(joined),
                () = shutdown.wait() => break,
            }
        }

        // Running ticks see the same shutdown and record their interruption
        while let Some(joined) = ticks.join_next().await {
            log_tick(joined);
        }
    }

    fn schedule_next(&self, timers: &mut Scheduler, name: &str, now: DateTime<Utc>) {
        let Some(task) = self.tasks.get(name) else {
            return;
        };
        let next = task.def.trigger.next_after(now);
        match next {
            Some(at) => timers.schedule(name, at),
            None => tracing::warn!(task = name, trigger = %task.def.trigger, "trigger has no future firings"),
        }
        self.board.set_next_fire(name, next);
    }

    fn fire(&self, ticks: &mut JoinSet<TickResult>, name: &str, shutdown: &Shutdown) {
        let Some(task) = self.tasks.get(name) else {
            return;
        };
        let Some(guard) = self.board.try_begin(name) else {
            tracing::info!(task = name, "previous run still in progress; skipping tick");
            return;
        };

        let coordinator = Arc::clone(&self.coordinator);
        let def = task.def.clone();
        let job = Arc::clone(&task.job);
        let shutdown = shutdown.clone();
        ticks.spawn(async move {
            let _guard = guard;
            let result = coordinator.run_tick(&def, job, &shutdown).await;
            (def.name, result)
        });
    }
}

fn log_tick(joined: Result<TickResult, tokio::task::JoinError>) {
    match joined {
        Ok((task, Ok(TickOutcome::Skipped(reason)))) => {
            tracing::info!(task = %task, %reason, "tick skipped")
        }
        Ok((task, Ok(TickOutcome::Cancelled))) => {
            tracing::debug!(task = %task, "tick cancelled by shutdown")
        }
        Ok((task, Ok(TickOutcome::Completed { history_id, .. }))) => {
            tracing::debug!(task = %task, history_id = ?history_id.map(|id| id.0), "tick completed")
        }
        Ok((task, Err(e))) => tracing::warn!(task = %task, error = %e, "tick interrupted"),
        Err(e) => tracing::error!(error = %e, "tick task failed"),
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
