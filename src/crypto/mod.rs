//! Cryptographic layer for the persisted ledger.

pub mod hybrid;
pub mod keystore;
pub mod symmetric;

pub use hybrid::{open_hybrid, seal_hybrid, SealedPayload};
pub use keystore::KeyPair;
