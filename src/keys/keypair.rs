//! Admin key pair generation, fingerprinting and rotation.
//!
//! Keys are RSA, handled as PEM strings at the API boundary (SPKI for public
//! keys, PKCS#8 for private keys). Signatures are PKCS#1 v1.5 over SHA-256.

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::TrustError;
use crate::keys::encryption::encrypt_private_key;

/// Supported RSA modulus sizes. 2048 is the floor; 4096 is recommended for
/// long-lived admin keys.
pub const SUPPORTED_KEY_SIZES: [usize; 3] = [2048, 3072, 4096];
pub const RECOMMENDED_KEY_SIZE: usize = 4096;

/// Freshly generated key pair, PEM-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedKeyPair {
    pub public_key_pem: String,
    pub private_key_pem: String,
    pub fingerprint: String,
    pub key_size_bits: usize,
}

/// Result of a key rotation: the replacement pair plus the old private key
/// sealed for archival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotatedKeyPair {
    pub new_pair: GeneratedKeyPair,
    pub archived_old_key: String,
}

/// Generate a new RSA key pair of the given modulus size.
pub fn generate_key_pair(key_size_bits: usize) -> Result<GeneratedKeyPair, TrustError> {
    if !SUPPORTED_KEY_SIZES.contains(&key_size_bits) {
        return Err(TrustError::KeyGenerationFailed(format!(
            "unsupported key size {} (supported: {:?})",
            key_size_bits, SUPPORTED_KEY_SIZES
        )));
    }

    let mut rng = rand::rngs::OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, key_size_bits)
        .map_err(|e| TrustError::KeyGenerationFailed(format!("RSA generation failed: {}", e)))?;
    let public_key = RsaPublicKey::from(&private_key);

    let public_key_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| TrustError::KeyGenerationFailed(format!("PEM encoding failed: {}", e)))?;
    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| TrustError::KeyGenerationFailed(format!("PEM encoding failed: {}", e)))?
        .to_string();

    let fp = fingerprint(&public_key_pem)?;
    info!("Generated {}-bit admin key pair ({})", key_size_bits, fp);

    Ok(GeneratedKeyPair {
        public_key_pem,
        private_key_pem,
        fingerprint: fp,
        key_size_bits,
    })
}

/// Deterministic fingerprint of a public key: SHA-256 over the SPKI DER,
/// rendered as colon-separated hex pairs. Pure function of the key material;
/// PEM whitespace variations do not change the result.
pub fn fingerprint(public_key_pem: &str) -> Result<String, TrustError> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| TrustError::InvalidKeyFormat(format!("not a public key PEM: {}", e)))?;
    let der = public_key
        .to_public_key_der()
        .map_err(|e| TrustError::InvalidKeyFormat(format!("DER encoding failed: {}", e)))?;

    let digest = Sha256::digest(der.as_bytes());
    let hex = hex::encode(digest);
    let pairs: Vec<&str> = hex
        .as_bytes()
        .chunks(2)
        .map(|c| std::str::from_utf8(c).unwrap_or(""))
        .collect();
    Ok(pairs.join(":"))
}

/// Structural well-formedness check; never fails on malformed input.
pub fn validate_public_key(public_key_pem: &str) -> bool {
    RsaPublicKey::from_public_key_pem(public_key_pem).is_ok()
}

/// Structural well-formedness check; never fails on malformed input.
pub fn validate_private_key(private_key_pem: &str) -> bool {
    RsaPrivateKey::from_pkcs8_pem(private_key_pem).is_ok()
}

/// Sign a message with a PEM private key. Returns the signature hex-encoded.
pub fn sign_message(private_key_pem: &str, message: &str) -> Result<String, TrustError> {
    let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| TrustError::InvalidKeyFormat(format!("not a private key PEM: {}", e)))?;

    let signing_key = SigningKey::<Sha256>::new(private_key);
    let signature = signing_key.sign(message.as_bytes());
    Ok(hex::encode(signature.to_bytes()))
}

/// Verify a hex-encoded signature against a PEM public key.
///
/// Malformed keys or signatures are errors; a well-formed signature that does
/// not match returns `Ok(false)`.
pub fn verify_message(
    public_key_pem: &str,
    message: &str,
    signature_hex: &str,
) -> Result<bool, TrustError> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| TrustError::InvalidKeyFormat(format!("not a public key PEM: {}", e)))?;
    let signature_bytes = hex::decode(signature_hex)
        .map_err(|e| TrustError::SignatureVerification(format!("invalid signature hex: {}", e)))?;
    let signature = Signature::try_from(signature_bytes.as_slice())
        .map_err(|e| TrustError::SignatureVerification(format!("invalid signature: {}", e)))?;

    let verifying_key = VerifyingKey::<Sha256>::new(public_key);
    Ok(verifying_key.verify(message.as_bytes(), &signature).is_ok())
}

/// Generate a replacement key pair and seal the old private key under the
/// given passphrase for archival.
///
/// The registry itself is not touched: re-registering the new public key and
/// revoking the old one are separate, individually auditable steps.
pub fn rotate_keys(
    old_private_key_pem: &str,
    passphrase: &str,
) -> Result<RotatedKeyPair, TrustError> {
    let old_key = RsaPrivateKey::from_pkcs8_pem(old_private_key_pem)
        .map_err(|e| TrustError::InvalidKeyFormat(format!("not a private key PEM: {}", e)))?;

    let key_size_bits = old_key.size() * 8;
    if !SUPPORTED_KEY_SIZES.contains(&key_size_bits) {
        return Err(TrustError::InvalidKeyFormat(format!(
            "old key has unsupported size {} bits",
            key_size_bits
        )));
    }

    let new_pair = generate_key_pair(key_size_bits)?;
    let archived_old_key = encrypt_private_key(old_private_key_pem, passphrase)?;

    info!("Rotated admin key pair (new fingerprint {})", new_pair.fingerprint);
    Ok(RotatedKeyPair {
        new_pair,
        archived_old_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_pair() {
        let pair = generate_key_pair(2048).unwrap();
        assert!(pair.public_key_pem.contains("BEGIN PUBLIC KEY"));
        assert!(pair.private_key_pem.contains("BEGIN PRIVATE KEY"));
        assert_eq!(pair.key_size_bits, 2048);
        assert!(!pair.fingerprint.is_empty());
    }

    #[test]
    fn test_unsupported_key_size_rejected() {
        let err = generate_key_pair(1024).unwrap_err();
        assert!(matches!(err, TrustError::KeyGenerationFailed(_)));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let pair = generate_key_pair(2048).unwrap();
        let fp1 = fingerprint(&pair.public_key_pem).unwrap();
        let fp2 = fingerprint(&pair.public_key_pem).unwrap();
        assert_eq!(fp1, fp2);
        assert_eq!(fp1, pair.fingerprint);
        // 32 bytes as colon-separated pairs
        assert_eq!(fp1.split(':').count(), 32);
    }

    #[test]
    fn test_validate_keys() {
        let pair = generate_key_pair(2048).unwrap();
        assert!(validate_public_key(&pair.public_key_pem));
        assert!(validate_private_key(&pair.private_key_pem));
        assert!(!validate_public_key("not a key"));
        assert!(!validate_private_key(&pair.public_key_pem));
    }

    #[test]
    fn test_sign_and_verify_message() {
        let pair = generate_key_pair(2048).unwrap();
        let signature = sign_message(&pair.private_key_pem, "close election 42").unwrap();

        assert!(verify_message(&pair.public_key_pem, "close election 42", &signature).unwrap());
        assert!(!verify_message(&pair.public_key_pem, "tampered message", &signature).unwrap());
    }

    #[test]
    fn test_rotate_keys_produces_fresh_pair() {
        let pair = generate_key_pair(2048).unwrap();
        let rotated = rotate_keys(&pair.private_key_pem, "archive-pass").unwrap();

        assert_ne!(rotated.new_pair.fingerprint, pair.fingerprint);
        assert_eq!(rotated.new_pair.key_size_bits, 2048);
        assert!(!rotated.archived_old_key.is_empty());
    }
}
