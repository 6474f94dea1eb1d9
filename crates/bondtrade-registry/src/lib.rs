//! # bondtrade-registry
//!
//! Bond ownership on the shared ledger:
//!
//! - **OwnershipVerifier**: derives pseudo-identity owner hashes from each
//!   organization's private secret and checks ownership by re-derivation
//! - **PrivateBondBook**: the caller's private reserve-price extensions
//! - **PrivateInventory**: bonds the caller has staged but not yet published
//! - **BondRegistry**: create / read / edit / delete of public bond records,
//!   writing the private half to the creator's partition
//!
//! No organization name ever reaches the ledger; records carry owner hashes
//! that only the owning organization can reproduce.

pub mod private_bonds;
pub mod private_inventory;
pub mod registry;
pub mod verifier;

pub use private_bonds::PrivateBondBook;
pub use private_inventory::PrivateInventory;
pub use registry::BondRegistry;
pub use verifier::{derive_hash, KnownHashes, OwnershipVerifier};
