//! Identifiers used throughout BondTrade.
//!
//! Entity IDs (bonds, direct trades) use UUIDv7 so they sort by creation
//! time. Organization IDs and owner hashes are opaque strings handed to us by
//! the hosting platform or derived by the ownership verifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BondUid
// ---------------------------------------------------------------------------

/// Unique identifier of a bond record on the public ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BondUid(pub Uuid);

impl BondUid {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for BondUid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BondUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// DirectTradeId
// ---------------------------------------------------------------------------

/// Unique identifier of a direct trade negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectTradeId(pub Uuid);

impl DirectTradeId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DirectTradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DirectTradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dt:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OrgId
// ---------------------------------------------------------------------------

/// Membership identifier of a participating organization (e.g. `Org1MSP`).
///
/// Resolved by the hosting platform. Never written to the public ledger;
/// ledger records only carry [`OwnerHash`] pseudo-identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub String);

impl OrgId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// OwnerHash
// ---------------------------------------------------------------------------

/// Pseudo-identity standing in for an organization in ledger records.
///
/// Hex-encoded digest; opaque to everyone except the organization that can
/// re-derive it from its private secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerHash(pub String);

impl OwnerHash {
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Build an owner hash from raw digest bytes.
    #[must_use]
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for OwnerHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_uid_uniqueness() {
        let a = BondUid::new();
        let b = BondUid::new();
        assert_ne!(a, b);
    }

    #[test]
    fn trade_id_ordering() {
        let a = DirectTradeId::new();
        let b = DirectTradeId::new();
        assert!(a < b);
    }

    #[test]
    fn owner_hash_short_and_digest() {
        let h = OwnerHash::from_digest(&[0xab; 32]);
        assert_eq!(h.as_str().len(), 64);
        assert_eq!(h.short(), "abababab");

        let tiny = OwnerHash::new("abc");
        assert_eq!(tiny.short(), "abc");
    }

    #[test]
    fn ids_serialize_transparently() {
        let org = OrgId::new("Org1MSP");
        assert_eq!(serde_json::to_string(&org).unwrap(), "\"Org1MSP\"");

        let uid = BondUid::from_bytes([7u8; 16]);
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, format!("\"{}\"", uid.0));
    }
}
