//! m-of-n transaction engine.
//!
//! Owns the pending-transaction table for its process lifetime. The table is
//! guarded by a single mutex so the read-validate-append-flip sequence for a
//! transaction is atomic with respect to concurrent signers; every query
//! returns clones and never mutates. Persistence is the caller's concern.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::TrustConfig;
use crate::error::TrustError;
use crate::keys::keypair::{sign_message, verify_message};
use crate::keys::registry::AdminKeyRegistry;
use crate::multisig::transaction::{
    MultisigTransaction, SignatureRecord, TransactionStatus, TransactionType,
};

/// How far along a pending transaction is toward its threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureProgress {
    pub transaction_id: String,
    pub collected: usize,
    pub required: usize,
    pub remaining: usize,
    pub signers: Vec<String>,
    pub status: TransactionStatus,
}

pub struct TransactionEngine {
    config: TrustConfig,
    registry: Arc<RwLock<AdminKeyRegistry>>,
    transactions: Mutex<HashMap<String, MultisigTransaction>>,
}

impl TransactionEngine {
    pub fn new(config: TrustConfig, registry: Arc<RwLock<AdminKeyRegistry>>) -> Self {
        Self {
            config,
            registry,
            transactions: Mutex::new(HashMap::new()),
        }
    }

    fn required_signatures(&self, tx_type: TransactionType) -> Result<usize, TrustError> {
        let required = self.config.thresholds.required_signatures(tx_type);
        if required == 0 {
            return Err(TrustError::UnknownTransactionType(format!(
                "no threshold configured for '{}'",
                tx_type.as_str()
            )));
        }
        Ok(required)
    }

    /// Create a pending transaction. `expiry_hours` defaults to the
    /// configured value when `None`.
    pub fn create_transaction(
        &self,
        tx_type: TransactionType,
        payload: HashMap<String, String>,
        created_by: &str,
        expiry_hours: Option<i64>,
    ) -> Result<MultisigTransaction, TrustError> {
        {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.ensure_active(created_by)?;
        }
        let required = self.required_signatures(tx_type)?;
        let expiry = expiry_hours.unwrap_or(self.config.default_expiry_hours);

        let tx = MultisigTransaction::new(tx_type, payload, required, created_by, expiry);
        info!(
            "Created {} transaction {} by '{}' ({} signatures required)",
            tx_type.as_str(),
            tx.id,
            created_by,
            required
        );

        let mut transactions = self.transactions.lock().expect("transaction lock poisoned");
        transactions.insert(tx.id.clone(), tx.clone());
        Ok(tx)
    }

    /// Collect one admin signature over the canonical transaction form.
    ///
    /// The freshly produced signature is verified against the signer's
    /// registered public key before it is accepted; a key or algorithm
    /// mismatch is rejected rather than stored. Reaching the threshold flips
    /// the status to `Approved`, after which further sign calls fail with
    /// `InvalidState`.
    pub fn sign_transaction(
        &self,
        id: &str,
        admin_id: &str,
        private_key_pem: &str,
    ) -> Result<MultisigTransaction, TrustError> {
        let mut transactions = self.transactions.lock().expect("transaction lock poisoned");
        let tx = transactions
            .get_mut(id)
            .ok_or_else(|| TrustError::NotFound(id.to_string()))?;

        if tx.status != TransactionStatus::Pending {
            return Err(TrustError::InvalidState(format!(
                "transaction {} is {}, not pending",
                id,
                tx.status.as_str()
            )));
        }
        if tx.is_expired_at(Utc::now()) {
            tx.status = TransactionStatus::Expired;
            warn!("Transaction {} expired before signature by '{}'", id, admin_id);
            return Err(TrustError::Expired(format!(
                "transaction {} expired at {}",
                id,
                tx.expires_at.to_rfc3339()
            )));
        }

        let public_key_pem = {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.ensure_active(admin_id)?.public_key_pem.clone()
        };

        if tx.has_signed(admin_id) {
            return Err(TrustError::DuplicateSignature(format!(
                "admin '{}' already signed transaction {}",
                admin_id, id
            )));
        }

        let canonical = tx.canonical_string();
        let signature = sign_message(private_key_pem, &canonical)?;
        if !verify_message(&public_key_pem, &canonical, &signature)? {
            return Err(TrustError::SignatureVerification(format!(
                "signature by '{}' does not verify against the registered key",
                admin_id
            )));
        }

        tx.signatures.push(SignatureRecord {
            admin_id: admin_id.to_string(),
            signature,
            public_key_pem,
            signed_at: Utc::now(),
            verified: true,
        });
        debug!(
            "Transaction {} signed by '{}' ({}/{})",
            id,
            admin_id,
            tx.signature_count(),
            tx.required_signatures
        );

        if tx.signature_count() >= tx.required_signatures {
            tx.status = TransactionStatus::Approved;
            info!("Transaction {} approved", id);
        }
        Ok(tx.clone())
    }

    /// Record authorization completion. Actually performing the underlying
    /// operation is the caller's job.
    pub fn execute_transaction(
        &self,
        id: &str,
        executor: &str,
    ) -> Result<MultisigTransaction, TrustError> {
        let mut transactions = self.transactions.lock().expect("transaction lock poisoned");
        let tx = transactions
            .get_mut(id)
            .ok_or_else(|| TrustError::NotFound(id.to_string()))?;

        if tx.status != TransactionStatus::Approved {
            return Err(TrustError::InvalidState(format!(
                "transaction {} is {}, not approved",
                id,
                tx.status.as_str()
            )));
        }
        {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.ensure_active(executor)?;
        }

        tx.status = TransactionStatus::Executed;
        tx.executed_at = Some(Utc::now());
        info!("Transaction {} executed by '{}'", id, executor);
        Ok(tx.clone())
    }

    /// Any single registered admin may halt a pending transaction: unanimity
    /// is required to act, one objection is enough to stop.
    pub fn reject_transaction(
        &self,
        id: &str,
        admin_id: &str,
    ) -> Result<MultisigTransaction, TrustError> {
        let mut transactions = self.transactions.lock().expect("transaction lock poisoned");
        let tx = transactions
            .get_mut(id)
            .ok_or_else(|| TrustError::NotFound(id.to_string()))?;

        if tx.status != TransactionStatus::Pending {
            return Err(TrustError::InvalidState(format!(
                "transaction {} is {}, not pending",
                id,
                tx.status.as_str()
            )));
        }
        {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.ensure_active(admin_id)?;
        }

        tx.status = TransactionStatus::Rejected;
        warn!("Transaction {} rejected by '{}'", id, admin_id);
        Ok(tx.clone())
    }

    /// Sweep pending transactions past their expiry. Idempotent; safe on a
    /// timer scheduled by the caller.
    pub fn cleanup_expired_transactions(&self) -> usize {
        let now = Utc::now();
        let mut transactions = self.transactions.lock().expect("transaction lock poisoned");
        let mut swept = 0;
        for tx in transactions.values_mut() {
            if tx.status == TransactionStatus::Pending && tx.is_expired_at(now) {
                tx.status = TransactionStatus::Expired;
                swept += 1;
            }
        }
        if swept > 0 {
            info!("Expired {} stale transactions", swept);
        }
        swept
    }

    pub fn get_transaction(&self, id: &str) -> Option<MultisigTransaction> {
        let transactions = self.transactions.lock().expect("transaction lock poisoned");
        transactions.get(id).cloned()
    }

    pub fn get_pending_transactions(&self) -> Vec<MultisigTransaction> {
        self.filter(|tx| tx.status == TransactionStatus::Pending)
    }

    pub fn get_transactions_by_type(&self, tx_type: TransactionType) -> Vec<MultisigTransaction> {
        self.filter(|tx| tx.tx_type == tx_type)
    }

    pub fn get_transactions_by_creator(&self, admin_id: &str) -> Vec<MultisigTransaction> {
        self.filter(|tx| tx.created_by == admin_id)
    }

    pub fn get_transactions_signed_by(&self, admin_id: &str) -> Vec<MultisigTransaction> {
        self.filter(|tx| tx.has_signed(admin_id))
    }

    fn filter<F>(&self, predicate: F) -> Vec<MultisigTransaction>
    where
        F: Fn(&MultisigTransaction) -> bool,
    {
        let transactions = self.transactions.lock().expect("transaction lock poisoned");
        let mut matched: Vec<MultisigTransaction> = transactions
            .values()
            .filter(|tx| predicate(tx))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        matched
    }

    pub fn signature_progress(&self, id: &str) -> Option<SignatureProgress> {
        let transactions = self.transactions.lock().expect("transaction lock poisoned");
        transactions.get(id).map(|tx| SignatureProgress {
            transaction_id: tx.id.clone(),
            collected: tx.signature_count(),
            required: tx.required_signatures,
            remaining: tx.required_signatures.saturating_sub(tx.signature_count()),
            signers: tx.signatures.iter().map(|s| s.admin_id.clone()).collect(),
            status: tx.status,
        })
    }
}
