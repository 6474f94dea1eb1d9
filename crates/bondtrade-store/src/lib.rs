//! # bondtrade-store
//!
//! Storage seams for BondTrade. The replicated ledger store and the
//! per-organization private partitions are provided by the hosting platform;
//! this crate defines the traits the rest of the workspace codes against,
//! in-memory implementations of both, and the [`LedgerRepository`] that owns
//! load / verify / commit of the ledger aggregate.
//!
//! ## Write path
//!
//! ```text
//! LedgerRepository.load() → mutate copy → TradeLedger.verify_invariants()
//!     → LedgerStore.put(expected_version) → new version | StoreConflict
//! ```

pub mod ledger_store;
pub mod private_store;
pub mod repository;

pub use ledger_store::{InMemoryLedgerStore, LedgerStore, VersionedDocument};
pub use private_store::{InMemoryPrivateStore, PrivatePartition, PrivateStore};
pub use repository::{LedgerRepository, LedgerSnapshot};
