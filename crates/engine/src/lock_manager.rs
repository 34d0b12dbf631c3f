// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-bounded named locks shared by replicas
//!
//! Every decision goes through [`shed_core::lock::transition`]; the manager
//! reads the current record, computes the next one, and applies it with a
//! single compare-and-swap. Storage failures on acquire fail closed.

use chrono::{DateTime, Utc};
use shed_core::lock::transition;
use shed_core::{Clock, HoldPolicy, HolderId, Lease, LockInput, LockRejection};
use shed_storage::{LockStore, StoreError};
use std::time::Duration;

/// Result of an acquisition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    Granted(Lease),
    Denied(DenyReason),
}

impl Acquisition {
    pub fn is_granted(&self) -> bool {
        matches!(self, Acquisition::Granted(_))
    }
}

/// Why an acquisition was denied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// Another holder's lease is still active
    Held {
        holder: HolderId,
        until: DateTime<Utc>,
    },
    /// Lost the compare-and-swap race to another replica
    Contended,
    /// The lock store could not be reached
    Unavailable(String),
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::Held { holder, until } => write!(f, "held by {} until {}", holder, until),
            DenyReason::Contended => write!(f, "lost race to another replica"),
            DenyReason::Unavailable(msg) => write!(f, "lock store unavailable: {}", msg),
        }
    }
}

/// Result of releasing a lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released { until: DateTime<Utc> },
    /// The record no longer belongs to this lease
    NotHeld,
}

/// Bound on one acquisition (read plus compare-and-swap)
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Acquires, extends and releases locks against a [`LockStore`]
#[derive(Clone)]
pub struct LockManager<L, C> {
    store: L,
    clock: C,
    acquire_timeout: Duration,
}

impl<L: LockStore, C: Clock> LockManager<L, C> {
    pub fn new(store: L, clock: C) -> Self {
        Self {
            store,
            clock,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn store(&self) -> &L {
        &self.store
    }

    /// Acquire at the manager clock's current time
    pub async fn acquire(&self, name: &str, policy: HoldPolicy, holder: &HolderId) -> Acquisition {
        self.acquire_at(name, policy, holder, self.clock.now()).await
    }

    /// Acquire `name` for `holder` as of `now`.
    ///
    /// Succeeds only if no record exists or the current one has expired.
    /// Never retries within the call. A store that does not answer within
    /// the acquire timeout counts as unavailable.
    pub async fn acquire_at(
        &self,
        name: &str,
        policy: HoldPolicy,
        holder: &HolderId,
        now: DateTime<Utc>,
    ) -> Acquisition {
        let attempt = self.try_acquire(name, policy, holder, now);
        match tokio::time::timeout(self.acquire_timeout, attempt).await {
            Ok(acquisition) => acquisition,
            Err(_) => unavailable(
                name,
                StoreError::Unavailable(format!(
                    "no answer within {}ms",
                    self.acquire_timeout.as_millis()
                )),
            ),
        }
    }

    async fn try_acquire(
        &self,
        name: &str,
        policy: HoldPolicy,
        holder: &HolderId,
        now: DateTime<Utc>,
    ) -> Acquisition {
        let current = match self.store.get(name).await {
            Ok(current) => current,
            Err(e) => return unavailable(name, e),
        };

        let input = LockInput::Acquire {
            holder: holder.clone(),
            policy,
        };
        let next = match transition(name, current.as_ref(), input, now) {
            Ok(next) => next,
            Err(LockRejection::Held { holder, until, .. }) => {
                tracing::info!(lock = name, %holder, %until, "lock held elsewhere");
                return Acquisition::Denied(DenyReason::Held { holder, until });
            }
            Err(rejection) => {
                tracing::info!(lock = name, %rejection, "lock not acquired");
                return Acquisition::Denied(DenyReason::Contended);
            }
        };

        match self.store.compare_and_swap(current.as_ref(), next.clone()).await {
            Ok(true) => {
                tracing::debug!(lock = name, %holder, until = %next.locked_until, "lock granted");
                Acquisition::Granted(Lease::new(&next, &policy))
            }
            Ok(false) => {
                tracing::info!(lock = name, %holder, "lost lock race");
                Acquisition::Denied(DenyReason::Contended)
            }
            Err(e) => unavailable(name, e),
        }
    }

    /// Shorten the lease to `max(now, locked_at + min_hold)`.
    ///
    /// Never lengthens the lease, so a release after `max_hold` leaves the
    /// record as it was.
    pub async fn release(&self, lease: &Lease) -> Result<ReleaseOutcome, StoreError> {
        let now = self.clock.now();
        let current = self.store.get(&lease.name).await?;
        let input = LockInput::Release {
            holder: lease.holder.clone(),
            locked_at: lease.locked_at,
            not_before: lease.min_hold_until,
        };
        let next = match transition(&lease.name, current.as_ref(), input, now) {
            Ok(next) => next,
            Err(rejection) => {
                tracing::debug!(lock = %lease.name, %rejection, "nothing to release");
                return Ok(ReleaseOutcome::NotHeld);
            }
        };

        let until = next.locked_until;
        if self.store.compare_and_swap(current.as_ref(), next).await? {
            tracing::debug!(lock = %lease.name, %until, "lock released");
            Ok(ReleaseOutcome::Released { until })
        } else {
            Ok(ReleaseOutcome::NotHeld)
        }
    }

    /// Push the lease out to at least `now + by`.
    ///
    /// Returns the refreshed lease, or `None` if it expired or was taken.
    pub async fn extend(&self, lease: &Lease, by: Duration) -> Result<Option<Lease>, StoreError> {
        let now = self.clock.now();
        let current = self.store.get(&lease.name).await?;
        let input = LockInput::Extend {
            holder: lease.holder.clone(),
            locked_at: lease.locked_at,
            by,
        };
        let next = match transition(&lease.name, current.as_ref(), input, now) {
            Ok(next) => next,
            Err(rejection) => {
                tracing::info!(lock = %lease.name, %rejection, "lease lost");
                return Ok(None);
            }
        };

        let until = next.locked_until;
        if self.store.compare_and_swap(current.as_ref(), next).await? {
            Ok(Some(Lease {
                locked_until: until,
                ..lease.clone()
            }))
        } else {
            Ok(None)
        }
    }
}

fn unavailable(name: &str, error: StoreError) -> Acquisition {
    tracing::warn!(lock = name, error = %error, "lock store unreachable; skipping");
    Acquisition::Denied(DenyReason::Unavailable(error.to_string()))
}

#[cfg(test)]
#[path = "lock_manager_tests.rs"]
mod tests;
