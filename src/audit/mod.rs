//! Tamper-evident audit log: hash chaining, keyed entry signatures, Merkle
//! batch commitment and signed snapshots.

pub mod chain;
pub mod entry;
pub mod merkle;
pub mod snapshot;

pub use chain::{AuditChain, ChainVerification};
pub use entry::{AuditEvent, ChainedLogEntry, GENESIS_HASH};
pub use merkle::{
    generate_merkle_proof, generate_merkle_root, verify_merkle_proof, MerkleProof,
};
pub use snapshot::{
    export_logs_to_archive, load_archive_file, parse_archive, ArchiveFormat, LogSnapshot,
};
