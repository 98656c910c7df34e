//! Admin key registry.
//!
//! Holds the public key of every onboarded administrator, capped at the
//! configured total. Records are never deleted; revocation flips the status
//! so a revoked admin stays distinguishable from an unknown identity in
//! error messages and the audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::TrustError;
use crate::keys::keypair::{fingerprint, validate_public_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminKeyStatus {
    Active,
    Revoked,
}

impl AdminKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminKeyStatus::Active => "active",
            AdminKeyStatus::Revoked => "revoked",
        }
    }
}

/// Registry entry for one administrator key.
///
/// Invariant: `fingerprint` is always `fingerprint(public_key_pem)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminKeyRecord {
    pub admin_id: String,
    pub public_key_pem: String,
    pub fingerprint: String,
    /// Private key sealed under a passphrase, kept only for archival.
    pub encrypted_private_key: Option<String>,
    pub status: AdminKeyStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct AdminKeyRegistry {
    total_admins: usize,
    records: HashMap<String, AdminKeyRecord>,
}

impl AdminKeyRegistry {
    pub fn new(total_admins: usize) -> Self {
        Self {
            total_admins,
            records: HashMap::new(),
        }
    }

    /// Register an admin public key.
    ///
    /// Re-registering an existing admin id replaces its key (the rotation
    /// flow: register the new key, then revoke happens on the old record
    /// implicitly by replacement). New registrations beyond the configured
    /// cap are rejected.
    pub fn register_admin(
        &mut self,
        admin_id: &str,
        public_key_pem: &str,
    ) -> Result<AdminKeyRecord, TrustError> {
        if !validate_public_key(public_key_pem) {
            return Err(TrustError::InvalidKeyFormat(format!(
                "public key for admin '{}' does not parse",
                admin_id
            )));
        }
        if !self.records.contains_key(admin_id) && self.records.len() >= self.total_admins {
            return Err(TrustError::RegistryFull(format!(
                "registry already holds {} admins",
                self.total_admins
            )));
        }

        let record = AdminKeyRecord {
            admin_id: admin_id.to_string(),
            public_key_pem: public_key_pem.to_string(),
            fingerprint: fingerprint(public_key_pem)?,
            encrypted_private_key: None,
            status: AdminKeyStatus::Active,
            created_at: Utc::now(),
        };

        info!(
            "Registered admin '{}' (fingerprint {})",
            admin_id, record.fingerprint
        );
        self.records.insert(admin_id.to_string(), record.clone());
        Ok(record)
    }

    /// Attach a sealed private key to an existing record for archival.
    pub fn attach_encrypted_private_key(
        &mut self,
        admin_id: &str,
        sealed_key: &str,
    ) -> Result<(), TrustError> {
        let record = self
            .records
            .get_mut(admin_id)
            .ok_or_else(|| TrustError::unknown_admin(admin_id))?;
        record.encrypted_private_key = Some(sealed_key.to_string());
        Ok(())
    }

    /// Revoke an admin. The record is kept so later authorization failures
    /// can report "revoked" rather than "unknown".
    pub fn revoke_admin(&mut self, admin_id: &str) -> Result<(), TrustError> {
        let record = self
            .records
            .get_mut(admin_id)
            .ok_or_else(|| TrustError::unknown_admin(admin_id))?;
        record.status = AdminKeyStatus::Revoked;
        warn!("Revoked admin '{}'", admin_id);
        Ok(())
    }

    pub fn get(&self, admin_id: &str) -> Option<&AdminKeyRecord> {
        self.records.get(admin_id)
    }

    pub fn is_active(&self, admin_id: &str) -> bool {
        matches!(
            self.records.get(admin_id).map(|r| r.status),
            Some(AdminKeyStatus::Active)
        )
    }

    /// Look up an admin, requiring an active registration.
    pub fn ensure_active(&self, admin_id: &str) -> Result<&AdminKeyRecord, TrustError> {
        match self.records.get(admin_id) {
            Some(record) if record.status == AdminKeyStatus::Active => Ok(record),
            Some(_) => Err(TrustError::revoked_admin(admin_id)),
            None => Err(TrustError::unknown_admin(admin_id)),
        }
    }

    pub fn admin_count(&self) -> usize {
        self.records.len()
    }

    pub fn active_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.status == AdminKeyStatus::Active)
            .count()
    }
}
