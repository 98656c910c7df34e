use serde::{Deserialize, Serialize};
use std::env;

use crate::error::TrustError;
use crate::multisig::transaction::TransactionType;

/// Signature thresholds per administrative transaction type.
///
/// `start_decryption` is the custodian quorum; `emergency_shutdown` is
/// deliberately higher than the routine operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub create_election: usize,
    pub close_election: usize,
    pub cancel_election: usize,
    pub start_decryption: usize,
    pub publish_results: usize,
    pub rotate_keys: usize,
    pub emergency_shutdown: usize,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            create_election: 3,
            close_election: 3,
            cancel_election: 3,
            start_decryption: 3,
            publish_results: 3,
            rotate_keys: 4,
            emergency_shutdown: 5,
        }
    }
}

impl ThresholdTable {
    pub fn required_signatures(&self, tx_type: TransactionType) -> usize {
        match tx_type {
            TransactionType::CreateElection => self.create_election,
            TransactionType::CloseElection => self.close_election,
            TransactionType::CancelElection => self.cancel_election,
            TransactionType::StartDecryption => self.start_decryption,
            TransactionType::PublishResults => self.publish_results,
            TransactionType::RotateKeys => self.rotate_keys,
            TransactionType::EmergencyShutdown => self.emergency_shutdown,
        }
    }

    fn max(&self) -> usize {
        [
            self.create_election,
            self.close_election,
            self.cancel_election,
            self.start_decryption,
            self.publish_results,
            self.rotate_keys,
            self.emergency_shutdown,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Hard cap on the number of registered administrators.
    pub total_admins: usize,
    pub thresholds: ThresholdTable,
    /// Default lifetime of a pending transaction, in hours.
    pub default_expiry_hours: i64,
    /// Process-wide secret keying the audit chain HMAC.
    pub audit_secret: String,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            total_admins: 10,
            thresholds: ThresholdTable::default(),
            default_expiry_hours: 24,
            audit_secret: "change-me-audit-secret".to_string(),
        }
    }
}

impl TrustConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn load() -> Result<Self, TrustError> {
        let defaults = TrustConfig::default();

        let total_admins = read_usize("TRUST_TOTAL_ADMINS", defaults.total_admins)?;
        let thresholds = ThresholdTable {
            create_election: read_usize(
                "TRUST_THRESHOLD_CREATE_ELECTION",
                defaults.thresholds.create_election,
            )?,
            close_election: read_usize(
                "TRUST_THRESHOLD_CLOSE_ELECTION",
                defaults.thresholds.close_election,
            )?,
            cancel_election: read_usize(
                "TRUST_THRESHOLD_CANCEL_ELECTION",
                defaults.thresholds.cancel_election,
            )?,
            start_decryption: read_usize(
                "TRUST_THRESHOLD_START_DECRYPTION",
                defaults.thresholds.start_decryption,
            )?,
            publish_results: read_usize(
                "TRUST_THRESHOLD_PUBLISH_RESULTS",
                defaults.thresholds.publish_results,
            )?,
            rotate_keys: read_usize(
                "TRUST_THRESHOLD_ROTATE_KEYS",
                defaults.thresholds.rotate_keys,
            )?,
            emergency_shutdown: read_usize(
                "TRUST_THRESHOLD_EMERGENCY_SHUTDOWN",
                defaults.thresholds.emergency_shutdown,
            )?,
        };
        let default_expiry_hours =
            read_usize("TRUST_DEFAULT_EXPIRY_HOURS", defaults.default_expiry_hours as usize)?
                as i64;
        let audit_secret =
            env::var("TRUST_AUDIT_SECRET").unwrap_or(defaults.audit_secret);

        let config = TrustConfig {
            total_admins,
            thresholds,
            default_expiry_hours,
            audit_secret,
        };
        config.validate()?;
        Ok(config)
    }

    /// Every threshold must be reachable by the registered admin pool.
    pub fn validate(&self) -> Result<(), TrustError> {
        if self.total_admins == 0 {
            return Err(TrustError::Config(
                "total_admins must be at least 1".to_string(),
            ));
        }
        let max = self.thresholds.max();
        if max > self.total_admins {
            return Err(TrustError::Config(format!(
                "threshold {} exceeds total_admins {}",
                max, self.total_admins
            )));
        }
        if self.default_expiry_hours <= 0 {
            return Err(TrustError::Config(
                "default_expiry_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_usize(var: &str, default: usize) -> Result<usize, TrustError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|e| TrustError::Config(format!("invalid {}: {}", var, e))),
        Err(_) => Ok(default),
    }
}
