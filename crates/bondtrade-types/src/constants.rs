//! System-wide constants for BondTrade.

/// Key of the ledger document in the shared store.
pub const DEFAULT_LEDGER_KEY: &str = "ledger";

/// Private partition key holding the organization's owner-hash secret.
pub const SECRET_KEY: &str = "owner_secret";

/// Private partition key holding the list of private bond extensions.
pub const PRIVATE_BONDS_KEY: &str = "private_bonds_information";

/// Private partition key holding bonds staged before publication.
pub const INVENTORY_KEY: &str = "inventory";

/// Domain separator for owner-hash derivation.
pub const OWNER_HASH_DOMAIN: &[u8] = b"bondtrade:owner:v1:";

/// Length in bytes of a generated owner secret.
pub const GENERATED_SECRET_BYTES: usize = 32;

/// Default number of times a conflicted read-modify-write is repeated.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Version reported for a key that has never been written.
pub const ABSENT_VERSION: u64 = 0;
