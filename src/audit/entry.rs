//! Audit log entry types and hashing.
//!
//! Every security-relevant action in the surrounding system is recorded as
//! an [`AuditEvent`]; the chain service wraps it into a [`ChainedLogEntry`]
//! linked to its predecessor by hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Sentinel `previous_hash` for the first entry of a chain.
pub const GENESIS_HASH: &str =
    "sha256:0000000000000000000000000000000000000000000000000000000000000000";

/// Structured audit payload supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor: String,
    pub action: String,
    pub resource: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

impl AuditEvent {
    pub fn new(actor: &str, action: &str, resource: &str) -> Self {
        Self {
            actor: actor.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Canonical string representation for hashing.
    pub fn canonical_string(&self) -> String {
        format!(
            "action:{}|actor:{}|metadata:{}|resource:{}|timestamp:{}",
            self.action,
            self.actor,
            self.serialize_metadata(),
            self.resource,
            self.timestamp.to_rfc3339(),
        )
    }

    fn serialize_metadata(&self) -> String {
        let mut items: Vec<String> = self
            .metadata
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v))
            .collect();
        items.sort();
        items.join(",")
    }
}

/// An event bound into the hash chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainedLogEntry {
    pub event: AuditEvent,
    /// Digest of `event || previous_hash`.
    pub hash: String,
    pub previous_hash: String,
    /// Keyed digest over `hash`, under the chain service secret.
    pub signature: String,
}

/// SHA-256 over the canonical event form concatenated with the predecessor
/// hash.
pub fn compute_entry_hash(event: &AuditEvent, previous_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(event.canonical_string().as_bytes());
    hasher.update(b"|previous_hash:");
    hasher.update(previous_hash.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string_is_deterministic() {
        let event = AuditEvent::new("alice", "transaction.sign", "tx-1")
            .with_metadata("b", "2")
            .with_metadata("a", "1");
        assert_eq!(event.canonical_string(), event.canonical_string());
        assert!(event.canonical_string().contains("metadata:a:1,b:2"));
    }

    #[test]
    fn test_entry_hash_depends_on_predecessor() {
        let event = AuditEvent::new("alice", "transaction.sign", "tx-1");
        let h1 = compute_entry_hash(&event, GENESIS_HASH);
        let h2 = compute_entry_hash(&event, "sha256:abc");
        assert_ne!(h1, h2);
        assert!(h1.starts_with("sha256:"));
        assert_eq!(h1.len(), 71); // "sha256:" + 64 hex chars
    }

    #[test]
    fn test_entry_hash_depends_on_every_field() {
        let base = AuditEvent::new("alice", "transaction.sign", "tx-1");
        let h = compute_entry_hash(&base, GENESIS_HASH);

        let mut other = base.clone();
        other.actor = "bob".to_string();
        assert_ne!(compute_entry_hash(&other, GENESIS_HASH), h);

        let with_meta = base.with_metadata("k", "v");
        assert_ne!(compute_entry_hash(&with_meta, GENESIS_HASH), h);
    }
}
