//! Multi-signature transaction engine gating irreversible election
//! operations behind m-of-n admin approval.

pub mod engine;
pub mod payload;
pub mod transaction;

pub use engine::{SignatureProgress, TransactionEngine};
pub use payload::validate_payload;
pub use transaction::{
    MultisigTransaction, SignatureRecord, TransactionStatus, TransactionType,
};
