//! # queuemesh-store: Broker-local message store
//!
//! Each Broker holds an in-memory keyed store plus an append-only audit
//! log. This crate is pure: no networking. The replication fan-out to
//! other brokers (sending `/replicate` over HTTP) is orchestrated by the
//! HTTP handler in `queuemesh-broker`, which calls [`BrokerStore::store_primary`]
//! to do the local write before making outbound calls itself — keeping the
//! "no lock held across I/O" rule at the handler, not in this crate.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use queuemesh_types::{Key, Payload, Role};
use serde::{Deserialize, Serialize};

mod tests;

/// Errors returned by store operations.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BrokerStoreError {
    #[error("key not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, BrokerStoreError>;

/// A stored (key, payload) entry with its role tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub replica_of: Option<String>,
}

/// One audit-log entry, classifying the side effect of a write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEntry {
    StoredAsPrimary { key: Key, timestamp: DateTime<Utc> },
    StoredAsReplica { key: Key, replica_of: String, timestamp: DateTime<Utc> },
    PromotedToPrimary { timestamp: DateTime<Utc> },
}

/// Broker-local in-memory store: keyed entries plus an audit log.
///
/// Same-key writes on one broker are serialized by arrival order via the
/// single `Mutex` guarding the map (spec.md §4.2 ordering contract).
pub struct BrokerStore {
    entries: Mutex<HashMap<Key, MessageEntry>>,
    audit_log: Mutex<Vec<AuditEntry>>,
}

impl Default for BrokerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            audit_log: Mutex::new(Vec::new()),
        }
    }

    /// PRIMARY-path local write: role=primary, appends `stored_as_primary`.
    /// Replication fan-out to replica URLs is the caller's responsibility.
    pub fn store_primary(&self, key: Key, payload: Payload) {
        let timestamp = queuemesh_types::now();
        self.entries.lock().unwrap().insert(
            key.clone(),
            MessageEntry {
                payload,
                timestamp,
                role: Role::Primary,
                replica_of: None,
            },
        );
        self.audit_log
            .lock()
            .unwrap()
            .push(AuditEntry::StoredAsPrimary { key, timestamp });
        tracing::info!(%timestamp, "stored as primary");
    }

    /// REPLICA-path local write: role=replica, appends `stored_as_replica`.
    pub fn replicate(&self, key: Key, payload: Payload, primary_node: String) {
        let timestamp = queuemesh_types::now();
        self.entries.lock().unwrap().insert(
            key.clone(),
            MessageEntry {
                payload,
                timestamp,
                role: Role::Replica,
                replica_of: Some(primary_node.clone()),
            },
        );
        self.audit_log.lock().unwrap().push(AuditEntry::StoredAsReplica {
            key,
            replica_of: primary_node,
            timestamp,
        });
    }

    /// Returns the stored entry for `key`, if any.
    pub fn fetch(&self, key: &str) -> Option<MessageEntry> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Marks the node as a writable primary. Existing replica entries are
    /// left untouched; this only records the promotion in the audit log.
    pub fn promote(&self) {
        let timestamp = queuemesh_types::now();
        self.audit_log
            .lock()
            .unwrap()
            .push(AuditEntry::PromotedToPrimary { timestamp });
        tracing::info!(%timestamp, "promoted to primary");
    }

    /// Liveness snapshot: key count held right now.
    pub fn message_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// All stored entries, keyed by message key, for the `/messages` endpoint.
    pub fn all_entries(&self) -> HashMap<Key, MessageEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Audit-log entries classified as `stored_as_primary`, for `/log`.
    pub fn stored_as_primary(&self) -> Vec<AuditEntry> {
        self.audit_log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, AuditEntry::StoredAsPrimary { .. }))
            .cloned()
            .collect()
    }

    /// Audit-log entries classified as `stored_as_replica`, for `/log`.
    pub fn stored_as_replica(&self) -> Vec<AuditEntry> {
        self.audit_log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, AuditEntry::StoredAsReplica { .. }))
            .cloned()
            .collect()
    }
}
