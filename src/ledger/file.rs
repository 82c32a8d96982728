//! File-backed ledger store with atomic writes.
//!
//! Uses temp file + rename so an interrupted save never leaves a torn
//! ledger behind.

use crate::clock::Clock;
use crate::crypto::keystore::KeyPair;
use crate::ledger::book::Ledger;
use crate::ledger::format::LedgerRecord;
use crate::SubvaultError;
use chrono::{DateTime, Utc};
use rsa::RsaPublicKey;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A ledger read back from disk.
#[derive(Debug)]
pub struct LoadedLedger {
    /// The decrypted ledger.
    pub ledger: Ledger,
    /// When it was sealed; `None` when no file existed yet.
    pub saved_at: Option<DateTime<Utc>>,
}

/// Encrypted ledger file at a fixed path.
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    /// Store backed by `path`. The parent directory must exist on save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Seal `ledger` for `public_key` and replace the file atomically.
    ///
    /// Returns the stamp recorded in the file.
    pub fn save(
        &self,
        ledger: &Ledger,
        public_key: &RsaPublicKey,
        clock: &dyn Clock,
    ) -> Result<DateTime<Utc>, SubvaultError> {
        let record = LedgerRecord::seal(ledger, public_key, clock)?;
        let json = record.to_json()?;
        let temp_path = self.temp_path();

        if let Err(e) = fs::write(&temp_path, &json) {
            let _ = fs::remove_file(&temp_path);
            return Err(SubvaultError::LedgerIO(format!(
                "Failed to write temp file: {}",
                e
            )));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(SubvaultError::LedgerIO(format!(
                "Failed to rename ledger file: {}",
                e
            )));
        }

        info!(
            path = %self.path.display(),
            active = ledger.active().len(),
            inactive = ledger.inactive().len(),
            "ledger saved"
        );
        Ok(record.saved_at)
    }

    /// Read and open the ledger. A missing file is an empty ledger.
    pub fn load(&self, keys: &KeyPair) -> Result<LoadedLedger, SubvaultError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no ledger file, starting empty");
                return Ok(LoadedLedger {
                    ledger: Ledger::new(),
                    saved_at: None,
                });
            }
            Err(e) => {
                return Err(SubvaultError::LedgerLoad(format!(
                    "Failed to read ledger file: {}",
                    e
                )))
            }
        };

        let record = LedgerRecord::from_json(&json)?;
        let ledger = record.open(keys)?;
        info!(
            path = %self.path.display(),
            active = ledger.active().len(),
            inactive = ledger.inactive().len(),
            saved_at = %record.saved_at,
            "ledger loaded"
        );
        Ok(LoadedLedger {
            ledger,
            saved_at: Some(record.saved_at),
        })
    }

    /// Whether a ledger has been saved at this path.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::crypto::test_keys::{other_test_keys, test_keys};
    use crate::membership::{Membership, Tier};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use tempfile::TempDir;

    fn clock() -> FixedClock {
        FixedClock::at("2026-05-04T10:00:00Z")
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.register_client(
            "Ana Pérez",
            Membership::new(Tier::Pro, "ana@mail.com", "1111222233334444").unwrap(),
        );
        ledger
    }

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let temp_dir = TempDir::new().unwrap();
        let file = LedgerFile::new(temp_dir.path().join("clients.ledger"));
        assert!(!file.exists());
        let loaded = file.load(test_keys()).unwrap();
        assert!(loaded.ledger.is_empty());
        assert_eq!(loaded.saved_at, None);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let file = LedgerFile::new(temp_dir.path().join("clients.ledger"));

        let stamp = file
            .save(&sample_ledger(), &test_keys().public, &clock())
            .unwrap();
        assert_eq!(stamp, clock().now_utc());
        assert!(file.exists());
        assert!(!file.temp_path().exists());

        let loaded = file.load(test_keys()).unwrap();
        assert_eq!(loaded.ledger, sample_ledger());
        assert_eq!(loaded.saved_at, Some(stamp));
    }

    #[test]
    fn test_save_replaces_previous() {
        let temp_dir = TempDir::new().unwrap();
        let file = LedgerFile::new(temp_dir.path().join("clients.ledger"));

        file.save(&sample_ledger(), &test_keys().public, &clock())
            .unwrap();
        let mut updated = sample_ledger();
        updated.cancel(0).unwrap();
        file.save(&updated, &test_keys().public, &clock()).unwrap();

        assert_eq!(file.load(test_keys()).unwrap().ledger, updated);
    }

    #[test]
    fn test_wrong_key() {
        let temp_dir = TempDir::new().unwrap();
        let file = LedgerFile::new(temp_dir.path().join("clients.ledger"));
        file.save(&sample_ledger(), &test_keys().public, &clock())
            .unwrap();

        let result = file.load(other_test_keys());
        assert!(matches!(result, Err(SubvaultError::Unwrap(_))));
    }

    #[test]
    fn test_corrupted_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clients.ledger");
        fs::write(&path, b"\x00\x01garbage").unwrap();

        let result = LedgerFile::new(&path).load(test_keys());
        assert!(matches!(result, Err(SubvaultError::LedgerLoad(_))));
    }

    #[test]
    fn test_tampered_payload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clients.ledger");
        let file = LedgerFile::new(&path);
        file.save(&sample_ledger(), &test_keys().public, &clock())
            .unwrap();

        // Keep only the IV.
        let mut record = LedgerRecord::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        let payload = STANDARD.decode(&record.payload).unwrap();
        record.payload = STANDARD.encode(&payload[..16]);
        fs::write(&path, record.to_json().unwrap()).unwrap();

        let result = file.load(test_keys());
        assert!(matches!(result, Err(SubvaultError::Decrypt(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = LedgerFile::new(temp_dir.path().join("clients.ledger"));
        // Writes to /dev/full open fine and then fail with ENOSPC.
        std::os::unix::fs::symlink("/dev/full", file.temp_path()).unwrap();

        let result = file.save(&sample_ledger(), &test_keys().public, &clock());
        assert!(matches!(result, Err(SubvaultError::LedgerIO(_))));
        assert!(fs::symlink_metadata(file.temp_path()).is_err());
        assert!(!file.exists());
    }

    #[test]
    fn test_save_into_missing_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let file = LedgerFile::new(temp_dir.path().join("nope").join("clients.ledger"));
        let result = file.save(&sample_ledger(), &test_keys().public, &clock());
        assert!(matches!(result, Err(SubvaultError::LedgerIO(_))));
    }
}
