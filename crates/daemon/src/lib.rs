// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shed daemon library: configuration, file layout and the IPC protocol
//! shared by `shedd` and the `shed` CLI.

pub mod config;
pub mod paths;
pub mod protocol;

pub use config::{Config, ConfigError, JobBody, SchedulerConfig, TaskConfig};
pub use paths::DaemonPaths;
pub use protocol::{Request, Response, TaskSummary};
