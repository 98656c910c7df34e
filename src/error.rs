use thiserror::Error;

impl From<serde_json::Error> for TrustError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum TrustError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Invalid transaction state: {0}")]
    InvalidState(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Duplicate signature: {0}")]
    DuplicateSignature(String),

    #[error("Transaction expired: {0}")]
    Expired(String),

    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Admin registry full: {0}")]
    RegistryFull(String),

    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TrustError {
    pub fn unknown_admin(admin_id: &str) -> Self {
        Self::Unauthorized(format!("admin '{}' is not registered", admin_id))
    }

    pub fn revoked_admin(admin_id: &str) -> Self {
        Self::Unauthorized(format!("admin '{}' has been revoked", admin_id))
    }
}
