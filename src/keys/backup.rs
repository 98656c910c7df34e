//! Backup recovery codes for admin onboarding.
//!
//! Codes are 8 random hex characters formatted `XXXX-XXXX`. Callers must
//! persist only the hash, never the raw code.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate `count` high-entropy, human-typable recovery codes.
pub fn generate_backup_codes(count: usize) -> Vec<String> {
    let mut rng = rand::rngs::OsRng;
    (0..count)
        .map(|_| {
            let mut bytes = [0u8; 4];
            rng.fill_bytes(&mut bytes);
            let hex = hex::encode_upper(bytes);
            format!("{}-{}", &hex[..4], &hex[4..])
        })
        .collect()
}

/// Hash of a backup code, suitable for storage.
pub fn hash_backup_code(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    format!("sha256:{}", hex::encode(digest))
}

/// Check a presented code against a stored hash.
pub fn verify_backup_code(code: &str, stored_hash: &str) -> bool {
    hash_backup_code(code) == stored_hash
}
