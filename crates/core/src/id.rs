// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replica and history identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable that pins the replica identity
pub const REPLICA_ID_ENV: &str = "SHED_REPLICA_ID";

/// Identity of a lock holder / job executor (one per replica)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolve this process's identity.
    ///
    /// Checks `SHED_REPLICA_ID`, then `HOSTNAME` (the pod name under
    /// Kubernetes), and falls back to a random `replica-xxxxxxxx`.
    pub fn detect() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        [REPLICA_ID_ENV, "HOSTNAME"]
            .iter()
            .filter_map(|key| lookup(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .map(Self)
            .unwrap_or_else(Self::random)
    }

    fn random() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("replica-{}", &uuid[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HolderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Generated identifier of a job history entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(pub u64);

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn replica_env_wins_over_hostname() {
        let id = HolderId::from_lookup(lookup(&[(REPLICA_ID_ENV, "pod-a"), ("HOSTNAME", "host")]));
        assert_eq!(id, HolderId::new("pod-a"));
    }

    #[test]
    fn hostname_is_used_when_replica_env_missing() {
        let id = HolderId::from_lookup(lookup(&[("HOSTNAME", "scheduler-7d9f")]));
        assert_eq!(id.as_str(), "scheduler-7d9f");
    }

    #[test]
    fn blank_values_are_skipped() {
        let id = HolderId::from_lookup(lookup(&[(REPLICA_ID_ENV, "  "), ("HOSTNAME", "host")]));
        assert_eq!(id.as_str(), "host");
    }

    #[test]
    fn random_fallback_has_prefix() {
        let id = HolderId::from_lookup(lookup(&[]));
        assert!(id.as_str().starts_with("replica-"));
        assert_eq!(id.as_str().len(), "replica-".len() + 8);
    }

    #[test]
    fn ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&HolderId::new("a")).unwrap(), "\"a\"");
        assert_eq!(serde_json::to_string(&HistoryId(7)).unwrap(), "7");
    }
}
