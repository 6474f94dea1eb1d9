//! Load and store the [`TradeLedger`] aggregate.
//!
//! Every state-changing operation is `load → mutate copy → verify → commit`.
//! The commit carries the version the snapshot was read at, so two writers
//! racing from the same snapshot cannot both win. Nothing is cached between
//! operations.

use std::sync::Arc;

use bondtrade_types::{constants, Result, TradeLedger};

use crate::ledger_store::LedgerStore;

/// A decoded ledger document and the store version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub version: u64,
    pub ledger: TradeLedger,
}

/// Read-modify-write access to the ledger document under one fixed key.
#[derive(Clone)]
pub struct LedgerRepository {
    store: Arc<dyn LedgerStore>,
    key: String,
}

impl LedgerRepository {
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the current document. A missing document reads as an empty
    /// ledger at [`constants::ABSENT_VERSION`].
    pub fn load(&self) -> Result<LedgerSnapshot> {
        match self.store.get(&self.key)? {
            Some(doc) => {
                let ledger: TradeLedger = serde_json::from_str(&doc.body)?;
                tracing::debug!(
                    key = %self.key,
                    version = doc.version,
                    bonds = ledger.bonds.len(),
                    trades = ledger.trades.len(),
                    "Ledger loaded"
                );
                Ok(LedgerSnapshot {
                    version: doc.version,
                    ledger,
                })
            }
            None => Ok(LedgerSnapshot {
                version: constants::ABSENT_VERSION,
                ledger: TradeLedger::new(),
            }),
        }
    }

    /// Verify invariants, encode, and write `ledger` over `base_version`.
    ///
    /// # Errors
    /// - `InvariantViolation` if the new document is inconsistent
    /// - `StoreConflict` if someone else committed since `base_version`
    pub fn commit(&self, base_version: u64, ledger: &TradeLedger) -> Result<u64> {
        ledger.verify_invariants()?;
        let body = serde_json::to_string(ledger)?;
        match self.store.put(&self.key, body, base_version) {
            Ok(version) => {
                tracing::debug!(key = %self.key, version, "Ledger committed");
                Ok(version)
            }
            Err(err) => {
                if err.is_retryable() {
                    tracing::warn!(key = %self.key, base_version, error = %err, "Ledger commit conflicted");
                }
                Err(err)
            }
        }
    }

    /// One full read-modify-write attempt.
    ///
    /// `mutate` works on a private copy of the snapshot. If it fails, nothing
    /// is written; if it succeeds, the whole document is committed at once.
    pub fn transact<R>(&self, mutate: impl FnOnce(&mut TradeLedger) -> Result<R>) -> Result<R> {
        let LedgerSnapshot {
            version,
            mut ledger,
        } = self.load()?;
        let out = mutate(&mut ledger)?;
        self.commit(version, &ledger)?;
        Ok(out)
    }

    /// Write an empty ledger if none exists yet. Returns `true` if it wrote.
    pub fn initialize(&self) -> Result<bool> {
        if self.store.get(&self.key)?.is_some() {
            return Ok(false);
        }
        self.commit(constants::ABSENT_VERSION, &TradeLedger::new())?;
        tracing::info!(key = %self.key, "Ledger initialized");
        Ok(true)
    }
}
