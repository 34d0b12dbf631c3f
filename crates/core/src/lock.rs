// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock records and the pure lease transition function
//!
//! A lock is a named row holding `(locked_at, locked_until, locked_by)`.
//! Expiry is decided solely by comparing `locked_until` with the reader's
//! clock. There is no heartbeat: a holder that dies simply lets its lease
//! run out at `max_hold`.

use crate::clock::add_duration;
use crate::id::HolderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Minimum and maximum hold durations for a lock lease
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldPolicy {
    /// The lease is never given up before this much time has passed
    #[serde(with = "humantime_serde")]
    pub min_hold: Duration,
    /// The lease expires after this much time, finished or not
    #[serde(with = "humantime_serde")]
    pub max_hold: Duration,
}

/// Invalid hold policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("max_hold must be greater than zero")]
    ZeroMaxHold,
    #[error("min_hold ({min:?}) exceeds max_hold ({max:?})")]
    MinExceedsMax { min: Duration, max: Duration },
}

impl HoldPolicy {
    pub fn new(min_hold: Duration, max_hold: Duration) -> Result<Self, PolicyError> {
        if max_hold.is_zero() {
            return Err(PolicyError::ZeroMaxHold);
        }
        if min_hold > max_hold {
            return Err(PolicyError::MinExceedsMax {
                min: min_hold,
                max: max_hold,
            });
        }
        Ok(Self { min_hold, max_hold })
    }
}

/// Persisted state of a named lock
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    pub name: String,
    pub locked_until: DateTime<Utc>,
    pub locked_at: DateTime<Utc>,
    pub locked_by: HolderId,
}

impl LockRecord {
    /// A lock is active while `locked_until` is strictly in the future
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.locked_until > now
    }

    /// Check if the lock is actively held by a specific holder
    pub fn is_held_by(&self, holder: &HolderId, now: DateTime<Utc>) -> bool {
        self.is_active(now) && &self.locked_by == holder
    }

    /// Check whether this record is the lease `holder` acquired at `locked_at`
    fn is_lease_of(&self, holder: &HolderId, locked_at: DateTime<Utc>) -> bool {
        &self.locked_by == holder && self.locked_at == locked_at
    }
}

/// A granted claim on a lock, as seen by its holder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lease {
    pub name: String,
    pub holder: HolderId,
    pub locked_at: DateTime<Utc>,
    pub locked_until: DateTime<Utc>,
    /// Earliest time the lease may end, even when released explicitly
    pub min_hold_until: DateTime<Utc>,
}

impl Lease {
    pub fn new(record: &LockRecord, policy: &HoldPolicy) -> Self {
        Self {
            name: record.name.clone(),
            holder: record.locked_by.clone(),
            locked_at: record.locked_at,
            locked_until: record.locked_until,
            min_hold_until: add_duration(record.locked_at, policy.min_hold),
        }
    }
}

/// Inputs that drive lock transitions
#[derive(Clone, Debug)]
pub enum LockInput {
    /// Claim the lock for `policy.max_hold`
    Acquire {
        holder: HolderId,
        policy: HoldPolicy,
    },
    /// Push the expiry of an active lease to `now + by`
    Extend {
        holder: HolderId,
        locked_at: DateTime<Utc>,
        by: Duration,
    },
    /// End an active lease, but never before `not_before`
    Release {
        holder: HolderId,
        locked_at: DateTime<Utc>,
        not_before: DateTime<Utc>,
    },
}

/// Reasons a lock transition is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockRejection {
    #[error("lock '{name}' is held by {holder} until {until}")]
    Held {
        name: String,
        holder: HolderId,
        until: DateTime<Utc>,
    },
    #[error("lock '{name}' is not held by {holder}")]
    NotHolder { name: String, holder: HolderId },
    #[error("lease on lock '{name}' has already expired")]
    Expired { name: String },
}

/// Pure state transition: compute the record to write for `input`.
///
/// Callers persist the result with a compare-and-swap against `current`,
/// so two racing writers can never both succeed.
pub fn transition(
    name: &str,
    current: Option<&LockRecord>,
    input: LockInput,
    now: DateTime<Utc>,
) -> Result<LockRecord, LockRejection> {
    match input {
        LockInput::Acquire { holder, policy } => match current {
            Some(record) if record.is_active(now) => Err(LockRejection::Held {
                name: name.to_string(),
                holder: record.locked_by.clone(),
                until: record.locked_until,
            }),
            // Absent or expired: anyone may claim it
            _ => Ok(LockRecord {
                name: name.to_string(),
                locked_until: add_duration(now, policy.max_hold),
                locked_at: now,
                locked_by: holder,
            }),
        },

        LockInput::Extend {
            holder,
            locked_at,
            by,
        } => {
            let record = owned_lease(name, current, &holder, locked_at)?;
            if !record.is_active(now) {
                return Err(LockRejection::Expired {
                    name: name.to_string(),
                });
            }
            Ok(LockRecord {
                locked_until: record.locked_until.max(add_duration(now, by)),
                ..record.clone()
            })
        }

        LockInput::Release {
            holder,
            locked_at,
            not_before,
        } => {
            let record = owned_lease(name, current, &holder, locked_at)?;
            if !record.is_active(now) {
                return Err(LockRejection::Expired {
                    name: name.to_string(),
                });
            }
            // Honor the minimum hold, and never lengthen the lease
            let until = now.max(not_before).min(record.locked_until);
            Ok(LockRecord {
                locked_until: until,
                ..record.clone()
            })
        }
    }
}

fn owned_lease<'a>(
    name: &str,
    current: Option<&'a LockRecord>,
    holder: &HolderId,
    locked_at: DateTime<Utc>,
) -> Result<&'a LockRecord, LockRejection> {
    match current {
        Some(record) if record.is_lease_of(holder, locked_at) => Ok(record),
        _ => Err(LockRejection::NotHolder {
            name: name.to_string(),
            holder: holder.clone(),
        }),
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
