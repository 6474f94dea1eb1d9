//! The shared, versioned key-value store holding the ledger document.
//!
//! The real store is replicated and validates read/write sets. All we rely
//! on is a compare-and-set write: a put carries the version the writer read,
//! and is rejected with [`BondtradeError::StoreConflict`] if the key moved
//! on in the meantime.

use std::collections::HashMap;
use std::sync::Mutex;

use bondtrade_types::{constants, BondtradeError, Result};

/// A stored document and the version it was written at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedDocument {
    /// Starts at 1 for the first write; [`constants::ABSENT_VERSION`] means
    /// "never written".
    pub version: u64,
    pub body: String,
}

/// Versioned document store with single-key compare-and-set writes.
pub trait LedgerStore: Send + Sync {
    /// Current document under `key`, if any.
    ///
    /// # Errors
    /// [`BondtradeError::Store`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<VersionedDocument>>;

    /// Write `body` under `key` if its current version is still
    /// `expected_version`. Returns the new version.
    ///
    /// # Errors
    /// - [`BondtradeError::StoreConflict`] if the version moved on
    /// - [`BondtradeError::Store`] if the backend rejects the write; nothing
    ///   is written in that case
    fn put(&self, key: &str, body: String, expected_version: u64) -> Result<u64>;
}

/// Single-process [`LedgerStore`] used for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    docs: Mutex<HashMap<String, VersionedDocument>>,
}

impl InMemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version of `key`, or [`constants::ABSENT_VERSION`].
    pub fn version(&self, key: &str) -> Result<u64> {
        Ok(self
            .get(key)?
            .map_or(constants::ABSENT_VERSION, |d| d.version))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, VersionedDocument>>> {
        self.docs
            .lock()
            .map_err(|_| BondtradeError::Internal("ledger store mutex poisoned".into()))
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn get(&self, key: &str) -> Result<Option<VersionedDocument>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, body: String, expected_version: u64) -> Result<u64> {
        let mut docs = self.lock()?;
        let actual = docs
            .get(key)
            .map_or(constants::ABSENT_VERSION, |d| d.version);
        if actual != expected_version {
            return Err(BondtradeError::StoreConflict {
                key: key.to_string(),
                expected: expected_version,
                actual,
            });
        }
        let version = actual + 1;
        docs.insert(key.to_string(), VersionedDocument { version, body });
        Ok(version)
    }
}
