// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task triggers: when a scheduled task fires
//!
//! Cron expressions use the 6/7-field format of the `cron` crate
//! (`sec min hour day-of-month month day-of-week [year]`) evaluated in UTC.

use crate::clock::add_duration;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors building a trigger
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("invalid cron expression '{expr}': {message}")]
    InvalidCron { expr: String, message: String },
    #[error("interval must be greater than zero")]
    ZeroInterval,
}

/// When a task fires
#[derive(Debug, Clone)]
pub enum Trigger {
    Cron {
        expr: String,
        schedule: cron::Schedule,
    },
    Every(Duration),
}

impl Trigger {
    pub fn cron(expr: &str) -> Result<Self, TriggerError> {
        let schedule =
            cron::Schedule::from_str(expr).map_err(|e| TriggerError::InvalidCron {
                expr: expr.to_string(),
                message: e.to_string(),
            })?;
        Ok(Trigger::Cron {
            expr: expr.to_string(),
            schedule,
        })
    }

    pub fn every(interval: Duration) -> Result<Self, TriggerError> {
        if interval.is_zero() {
            return Err(TriggerError::ZeroInterval);
        }
        Ok(Trigger::Every(interval))
    }

    /// First firing strictly after `after`, if the schedule has one
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Cron { schedule, .. } => schedule.after(&after).next(),
            Trigger::Every(interval) => Some(add_duration(after, *interval)),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Cron { expr, .. } => write!(f, "cron({})", expr),
            Trigger::Every(interval) => write!(f, "every({:?})", interval),
        }
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
