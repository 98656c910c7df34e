//! Passphrase sealing of private keys for archival and rotation.
//!
//! The passphrase is stretched with PBKDF2-HMAC-SHA512 (per-record random
//! salt, 100 000 iterations) into a 256-bit key for ChaCha20-Poly1305. The
//! sealed blob is `salt || nonce || ciphertext`, base64-encoded.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use sha2::Sha512;

use crate::error::TrustError;
use crate::keys::keypair::validate_private_key;

const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const KDF_ITERATIONS: u32 = 100_000;

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; 32], TrustError> {
    let mut key = [0u8; 32];
    pbkdf2::<Hmac<Sha512>>(passphrase.as_bytes(), salt, KDF_ITERATIONS, &mut key)
        .map_err(|e| TrustError::DecryptionFailed(format!("key derivation failed: {}", e)))?;
    Ok(key)
}

/// Seal a PEM private key under a passphrase-derived key.
pub fn encrypt_private_key(
    private_key_pem: &str,
    passphrase: &str,
) -> Result<String, TrustError> {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    let key = derive_key(passphrase, &salt)?;

    let cipher = ChaCha20Poly1305::new(&key.into());
    let nonce = ChaCha20Poly1305::generate_nonce(&mut rand::rngs::OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, private_key_pem.as_bytes())
        .map_err(|_| TrustError::DecryptionFailed("AEAD encryption failed".to_string()))?;

    let mut blob = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(blob))
}

/// Unseal a private key sealed with [`encrypt_private_key`].
///
/// A wrong passphrase, a corrupted blob, and a blob that decrypts to
/// something other than a private key all surface as the same
/// `DecryptionFailed` error, so callers cannot distinguish which occurred.
pub fn decrypt_private_key(ciphertext_b64: &str, passphrase: &str) -> Result<String, TrustError> {
    let blob = BASE64
        .decode(ciphertext_b64)
        .map_err(|_| TrustError::DecryptionFailed("malformed sealed key".to_string()))?;
    if blob.len() < SALT_SIZE + NONCE_SIZE {
        return Err(TrustError::DecryptionFailed(
            "malformed sealed key".to_string(),
        ));
    }

    let (salt, rest) = blob.split_at(SALT_SIZE);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
    let key = derive_key(passphrase, salt)?;

    let cipher = ChaCha20Poly1305::new(&key.into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| TrustError::DecryptionFailed("decryption failed".to_string()))?;

    let pem = String::from_utf8(plaintext)
        .map_err(|_| TrustError::DecryptionFailed("decryption failed".to_string()))?;
    if !validate_private_key(&pem) {
        return Err(TrustError::DecryptionFailed("decryption failed".to_string()));
    }
    Ok(pem)
}
