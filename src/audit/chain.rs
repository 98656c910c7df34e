//! Hash-chained audit log service.
//!
//! Owns the single mutable chain tip. Appends are serialized by a mutex held
//! for the full read-hash-advance sequence, so no two entries can claim the
//! same predecessor. All verification functions are pure reads and fail
//! closed: they report invalid data, they never error.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audit::entry::{compute_entry_hash, AuditEvent, ChainedLogEntry, GENESIS_HASH};

type HmacSha256 = Hmac<Sha256>;

/// Outcome of verifying an ordered chain of entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerification {
    pub valid: bool,
    pub invalid_indices: Vec<usize>,
    pub total_logs: usize,
    pub valid_logs: usize,
}

pub struct AuditChain {
    secret: Vec<u8>,
    tip: Mutex<String>,
}

impl AuditChain {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            tip: Mutex::new(GENESIS_HASH.to_string()),
        }
    }

    /// Append an event to the chain, advancing the tip.
    pub fn create_log_entry(&self, event: AuditEvent) -> ChainedLogEntry {
        let mut tip = self.tip.lock().expect("chain tip lock poisoned");
        let previous_hash = tip.clone();
        let hash = compute_entry_hash(&event, &previous_hash);
        let signature = self.sign_hash(&hash);
        *tip = hash.clone();

        debug!(
            "Appended audit entry {} by '{}' ({})",
            hash, event.actor, event.action
        );
        ChainedLogEntry {
            event,
            hash,
            previous_hash,
            signature,
        }
    }

    /// Current chain tip (hash of the most recent entry, or the genesis
    /// sentinel for a fresh chain).
    pub fn tip(&self) -> String {
        self.tip.lock().expect("chain tip lock poisoned").clone()
    }

    /// Reset the tip to the genesis sentinel. Only for intentional rollover
    /// into a new archival period; never called implicitly.
    pub fn reset_chain(&self) {
        let mut tip = self.tip.lock().expect("chain tip lock poisoned");
        warn!("Audit chain reset to genesis (previous tip {})", *tip);
        *tip = GENESIS_HASH.to_string();
    }

    pub(crate) fn sign_hash(&self, hash: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(hash.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn signature_matches(&self, hash: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(hash.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    /// Verify a single entry: recompute the hash and the keyed digest.
    pub fn verify_log_entry(&self, entry: &ChainedLogEntry) -> bool {
        entry.hash == compute_entry_hash(&entry.event, &entry.previous_hash)
            && self.signature_matches(&entry.hash, &entry.signature)
    }

    /// Verify an ordered chain: each entry individually, plus the linkage
    /// `logs[i].previous_hash == logs[i-1].hash` for `i > 0`. An entry
    /// failing its own verification is counted invalid once; the linkage
    /// check does not double-count it.
    pub fn verify_log_chain(&self, logs: &[ChainedLogEntry]) -> ChainVerification {
        let mut invalid_indices = Vec::new();

        for (i, entry) in logs.iter().enumerate() {
            if !self.verify_log_entry(entry) {
                invalid_indices.push(i);
                continue;
            }
            if i > 0 && entry.previous_hash != logs[i - 1].hash {
                invalid_indices.push(i);
            }
        }

        let total_logs = logs.len();
        let valid_logs = total_logs - invalid_indices.len();
        let valid = invalid_indices.is_empty();
        if !valid {
            warn!(
                "Audit chain verification failed: {} of {} entries invalid",
                invalid_indices.len(),
                total_logs
            );
        } else {
            info!("Audit chain verified: {} entries", total_logs);
        }

        ChainVerification {
            valid,
            invalid_indices,
            total_logs,
            valid_logs,
        }
    }
}
