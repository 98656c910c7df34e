//! Key management: generation, fingerprinting, encryption at rest,
//! registration and rotation of administrator key pairs.

pub mod backup;
pub mod encryption;
pub mod keypair;
pub mod registry;

pub use backup::{generate_backup_codes, hash_backup_code, verify_backup_code};
pub use encryption::{decrypt_private_key, encrypt_private_key};
pub use keypair::{
    fingerprint, generate_key_pair, rotate_keys, sign_message, validate_private_key,
    validate_public_key, verify_message, GeneratedKeyPair, RotatedKeyPair,
    RECOMMENDED_KEY_SIZE, SUPPORTED_KEY_SIZES,
};
pub use registry::{AdminKeyRecord, AdminKeyRegistry, AdminKeyStatus};
