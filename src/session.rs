//! Session - the owned application state behind the console.
//!
//! A `Session` holds everything the program mutates:
//! - The key pair (loaded, or generated on first run)
//! - The client ledger (loaded at open, saved on request)
//!
//! Business operations go through the session so the front end never
//! touches files or keys directly.

use crate::clock::{Clock, SystemClock};
use crate::config::SubvaultConfig;
use crate::crypto::keystore::{load_or_generate, KeyPair};
use crate::ledger::{Ledger, LedgerFile};
use crate::membership::{Membership, TierChange};
use crate::SubvaultError;
use chrono::{DateTime, Utc};
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

/// Loaded keys plus the in-memory ledger.
pub struct Session {
    config: SubvaultConfig,
    clock: Arc<dyn Clock>,
    keys: KeyPair,
    store: LedgerFile,
    ledger: Ledger,
    last_saved: Option<DateTime<Utc>>,
}

impl Session {
    /// Open the data directory: load or create keys, then load the ledger.
    ///
    /// # Errors
    /// - `ConfigError` - configuration is invalid
    /// - `KeyLoad` / `KeyGeneration` / `KeyStore` - key pair unavailable
    /// - `LedgerLoad` - ledger file is corrupt
    /// - `Unwrap` / `Padding` / `Decrypt` - ledger cannot be opened with these keys
    pub fn open(config: SubvaultConfig) -> Result<Self, SubvaultError> {
        config.validate()?;
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Open with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn open_with_clock(
        config: SubvaultConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SubvaultError> {
        config.validate()?;
        Self::with_clock(config, clock)
    }

    fn with_clock(config: SubvaultConfig, clock: Arc<dyn Clock>) -> Result<Self, SubvaultError> {
        fs::create_dir_all(config.data_dir()).map_err(|e| {
            SubvaultError::ConfigError(format!(
                "Failed to create data dir {}: {}",
                config.data_dir().display(),
                e
            ))
        })?;

        let keys = load_or_generate(
            &config.private_key_path(),
            &config.public_key_path(),
            config.key_bits,
        )?;
        let store = LedgerFile::new(config.ledger_path());
        let loaded = store.load(&keys)?;

        info!(
            data_dir = %config.data_dir().display(),
            clients = loaded.ledger.len(),
            "session opened"
        );

        Ok(Self {
            config,
            clock,
            keys,
            store,
            ledger: loaded.ledger,
            last_saved: loaded.saved_at,
        })
    }

    /// Current ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Loaded key pair.
    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    /// When the ledger on disk was last written, if it exists.
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Active configuration.
    pub fn config(&self) -> &SubvaultConfig {
        &self.config
    }

    /// Register a new active client.
    pub fn register_client(&mut self, full_name: impl Into<String>, membership: Membership) {
        self.ledger.register_client(full_name, membership);
    }

    /// Change an active client's tier.
    pub fn change_tier(&mut self, index: usize, target_id: u8) -> Result<TierChange, SubvaultError> {
        self.ledger.change_tier(index, target_id)
    }

    /// Cancel an active client's membership.
    pub fn cancel(&mut self, index: usize) -> Result<(), SubvaultError> {
        self.ledger.cancel(index)
    }

    /// Reactivate an inactive client on a paid tier.
    pub fn reactivate(&mut self, index: usize, target_id: u8) -> Result<(), SubvaultError> {
        self.ledger.reactivate(index, target_id)
    }

    /// Record a parental-control change for an active client.
    pub fn modify_parental_control(&self, index: usize) -> Result<(), SubvaultError> {
        self.ledger.modify_parental_control(index)
    }

    /// Raise an active client's offline content allowance.
    pub fn increment_offline_content(&mut self, index: usize) -> Result<u32, SubvaultError> {
        self.ledger.increment_offline_content(index)
    }

    /// Seal and write the ledger, returning the save stamp.
    ///
    /// The in-memory ledger is untouched either way.
    pub fn save(&mut self) -> Result<DateTime<Utc>, SubvaultError> {
        let saved_at = self
            .store
            .save(&self.ledger, &self.keys.public, self.clock.as_ref())
            .map_err(|e| {
                warn!(error = %e, "save failed");
                e
            })?;
        self.last_saved = Some(saved_at);
        Ok(saved_at)
    }

    /// Replace the in-memory ledger with the saved one.
    ///
    /// On failure the current ledger is kept.
    pub fn reload(&mut self) -> Result<(), SubvaultError> {
        let loaded = self.store.load(&self.keys)?;
        self.ledger = loaded.ledger;
        self.last_saved = loaded.saved_at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::crypto::keystore::{save_private_key, save_public_key, MIN_KEY_BITS};
    use crate::crypto::test_keys::{other_test_keys, test_keys};
    use crate::membership::Tier;
    use tempfile::TempDir;

    fn config_with_keys(temp_dir: &TempDir, keys: &KeyPair) -> SubvaultConfig {
        let config = SubvaultConfig::in_dir(temp_dir.path()).with_key_bits(MIN_KEY_BITS);
        save_private_key(&keys.private, &config.private_key_path()).unwrap();
        save_public_key(&keys.public, &config.public_key_path()).unwrap();
        config
    }

    fn open(config: SubvaultConfig) -> Result<Session, SubvaultError> {
        Session::open_with_clock(
            config,
            Arc::new(FixedClock::at("2026-05-04T10:00:00Z")),
        )
    }

    fn pro() -> Membership {
        Membership::new(Tier::Pro, "a@b.co", "1111222233334444").unwrap()
    }

    #[test]
    fn test_first_run_generates_keys() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("state");
        let config = SubvaultConfig::in_dir(&data_dir).with_key_bits(MIN_KEY_BITS);

        let session = open(config.clone()).unwrap();
        assert!(session.ledger().is_empty());
        assert_eq!(session.last_saved_at(), None);
        assert!(config.private_key_path().exists());
        assert!(config.public_key_path().exists());
        assert!(!config.ledger_path().exists());
    }

    #[test]
    fn test_save_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_keys(&temp_dir, test_keys());

        let mut session = open(config.clone()).unwrap();
        session.register_client("Ana Pérez", pro());
        session.cancel(0).unwrap();
        session.reactivate(0, 3).unwrap();
        session.save().unwrap();
        let expected = session.ledger().clone();

        let reopened = open(config).unwrap();
        assert_eq!(reopened.ledger(), &expected);
        assert_eq!(
            reopened.last_saved_at(),
            Some(FixedClock::at("2026-05-04T10:00:00Z").now_utc())
        );
        assert_eq!(reopened.keys().public, test_keys().public);
    }

    #[test]
    fn test_reopen_with_other_keys_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_keys(&temp_dir, test_keys());
        let mut session = open(config.clone()).unwrap();
        session.register_client("Ana Pérez", pro());
        session.save().unwrap();

        let config = config_with_keys(&temp_dir, other_test_keys());
        assert!(matches!(open(config), Err(SubvaultError::Unwrap(_))));
    }

    #[test]
    fn test_failed_save_keeps_ledger() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_keys(&temp_dir, test_keys());
        let mut session = open(config).unwrap();
        session.register_client("Ana Pérez", pro());
        let before = session.ledger().clone();

        // Point the store somewhere unwritable.
        session.store = LedgerFile::new(temp_dir.path().join("missing").join("x.ledger"));
        assert!(matches!(session.save(), Err(SubvaultError::LedgerIO(_))));
        assert_eq!(session.ledger(), &before);
        assert_eq!(session.last_saved_at(), None);
    }

    #[test]
    fn test_failed_reload_keeps_ledger() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_keys(&temp_dir, test_keys());
        let mut session = open(config.clone()).unwrap();
        session.register_client("Ana Pérez", pro());
        session.save().unwrap();
        session.register_client("Luis Soto", pro());
        let before = session.ledger().clone();

        fs::write(config.ledger_path(), "{}").unwrap();
        assert!(matches!(session.reload(), Err(SubvaultError::LedgerLoad(_))));
        assert_eq!(session.ledger(), &before);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SubvaultConfig::in_dir("").with_key_bits(MIN_KEY_BITS);
        assert!(matches!(open(config), Err(SubvaultError::ConfigError(_))));
    }
}
