//! Client ledger and its encrypted persistence.

pub mod book;
pub mod file;
pub mod format;

pub use book::{Client, Ledger};
pub use file::{LedgerFile, LoadedLedger};
pub use format::LedgerRecord;
