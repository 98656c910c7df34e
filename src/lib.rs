pub mod audit;
pub mod config;
pub mod error;
pub mod keys;
pub mod multisig;

pub use error::TrustError;
