//! # Subvault
//!
//! **Streaming membership ledger with an encrypted store.**
//!
//! Subvault keeps a register of streaming-service clients and their
//! membership tiers, and persists it as a hybrid-encrypted file: the ledger
//! is encrypted with a fresh AES-256-CBC key on every save, and that key is
//! wrapped with the owner's RSA-OAEP public key.
//!
//! ## Features
//!
//! - **Tier state machine** - Free, Basic, Family, Offline and Pro, with an
//!   explicit transition table and derived device counts and costs
//! - **Validated registration** - email, card number and name checks that
//!   ask again instead of aborting
//! - **Hybrid envelope** - RSA-OAEP (SHA-256) key wrap over AES-256-CBC
//! - **Atomic saves** - temp file + rename, so a crash never tears the ledger
//!
//! ## Quickstart
//!
//! ```no_run
//! use subvault::{Membership, Session, SubvaultConfig, Tier};
//!
//! fn main() -> Result<(), subvault::SubvaultError> {
//!     let config = SubvaultConfig::default_location()?;
//!     let mut session = Session::open(config)?;
//!
//!     let membership = Membership::new(Tier::Pro, "a@b.co", "1111222233334444")?;
//!     session.register_client("Ana Pérez", membership);
//!     session.save()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! The ledger file reveals nothing about clients without the private key.
//! The private key itself is stored unencrypted next to the ledger (mode
//! 0600 on Unix), so anyone who can read the data directory can read the
//! ledger. Payloads carry no MAC: tampering shows up as a padding, unwrap or
//! parse failure, not as a dedicated integrity error.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Domain
pub mod membership;

// Persistence
pub mod ledger;

// Application state and front end
pub mod console;
pub mod session;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::SubvaultConfig;
pub use console::{Console, Exit};
pub use crypto::KeyPair;
pub use errors::SubvaultError;
pub use ledger::{Client, Ledger};
pub use membership::{Membership, Tier, TierChange};
pub use session::Session;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::FixedClock;
