//! Multi-signature transaction and signature record types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Irreversible administrative operations gated by m-of-n approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    CreateElection,
    CloseElection,
    CancelElection,
    StartDecryption,
    PublishResults,
    RotateKeys,
    EmergencyShutdown,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CreateElection => "create_election",
            TransactionType::CloseElection => "close_election",
            TransactionType::CancelElection => "cancel_election",
            TransactionType::StartDecryption => "start_decryption",
            TransactionType::PublishResults => "publish_results",
            TransactionType::RotateKeys => "rotate_keys",
            TransactionType::EmergencyShutdown => "emergency_shutdown",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_election" => Ok(TransactionType::CreateElection),
            "close_election" => Ok(TransactionType::CloseElection),
            "cancel_election" => Ok(TransactionType::CancelElection),
            "start_decryption" => Ok(TransactionType::StartDecryption),
            "publish_results" => Ok(TransactionType::PublishResults),
            "rotate_keys" => Ok(TransactionType::RotateKeys),
            "emergency_shutdown" => Ok(TransactionType::EmergencyShutdown),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// Transaction lifecycle. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Approved,
    Executed,
    Rejected,
    Expired,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Executed => "executed",
            TransactionStatus::Rejected => "rejected",
            TransactionStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

/// One collected signature. Unverifiable signatures are rejected before
/// insertion, so `verified` is always true for stored records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub admin_id: String,
    pub signature: String,
    /// Snapshot of the signer's public key at sign time.
    pub public_key_pem: String,
    pub signed_at: DateTime<Utc>,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultisigTransaction {
    pub id: String,
    pub tx_type: TransactionType,
    pub payload: HashMap<String, String>,
    pub required_signatures: usize,
    /// Insertion order is arrival order.
    pub signatures: Vec<SignatureRecord>,
    pub status: TransactionStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl MultisigTransaction {
    pub fn new(
        tx_type: TransactionType,
        payload: HashMap<String, String>,
        required_signatures: usize,
        created_by: &str,
        expiry_hours: i64,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tx_type,
            payload,
            required_signatures,
            signatures: Vec::new(),
            status: TransactionStatus::Pending,
            created_by: created_by.to_string(),
            created_at,
            expires_at: created_at + Duration::hours(expiry_hours),
            executed_at: None,
        }
    }

    /// Canonical representation signed by every admin.
    ///
    /// Fields appear in sorted key order with RFC 3339 timestamps; the
    /// signature list is deliberately excluded so collecting signatures never
    /// changes what is signed.
    pub fn canonical_string(&self) -> String {
        format!(
            "created_at:{}|created_by:{}|expires_at:{}|id:{}|payload:{}|required_signatures:{}|type:{}",
            self.created_at.to_rfc3339(),
            self.created_by,
            self.expires_at.to_rfc3339(),
            self.id,
            self.canonical_payload(),
            self.required_signatures,
            self.tx_type.as_str(),
        )
    }

    fn canonical_payload(&self) -> String {
        let mut items: Vec<String> = self
            .payload
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        items.sort();
        items.join(",")
    }

    pub fn has_signed(&self, admin_id: &str) -> bool {
        self.signatures.iter().any(|s| s.admin_id == admin_id)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }
}
