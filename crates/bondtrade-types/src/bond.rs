//! Bond records: the public ledger half and the private reserve-price half.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BondUid, BondtradeError, CallerIdentity, OrgId, OwnerHash, Result};

/// A bond position recorded on the public ledger.
///
/// Everything except `owner_hash` is fixed at creation. The owner hash is a
/// pseudo-identity and changes once per settlement that transfers the bond.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bond {
    pub uid: BondUid,
    /// Pool / issue name, e.g. `FR RA7777`.
    pub name: String,
    pub cusip: String,
    /// Face amount of the position.
    pub original_face: u64,
    pub owner_hash: OwnerHash,
    /// Free-form classification tags (`passthrough`, `MBS 30yr`, ...).
    #[serde(default)]
    pub classes: Vec<String>,
}

impl Bond {
    /// Build a bond from a creation request, assigning a uid if none was given.
    #[must_use]
    pub fn from_spec(spec: BondSpec, owner_hash: OwnerHash) -> Self {
        Self {
            uid: spec.uid.unwrap_or_default(),
            name: spec.name,
            cusip: spec.cusip,
            original_face: spec.original_face,
            owner_hash,
            classes: spec.classes,
        }
    }

    /// Whether this bond is a position in the given instrument.
    #[must_use]
    pub fn is_cusip(&self, cusip: &str) -> bool {
        self.cusip == cusip
    }
}

impl std::fmt::Display for Bond {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bond[{}] {} {} face={} owner={}",
            self.uid,
            self.name,
            self.cusip,
            self.original_face,
            self.owner_hash.short()
        )
    }
}

/// Caller-supplied description of a bond to create or edit.
///
/// The owner hash is never part of the request: the registry derives it
/// from the caller's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BondSpec {
    #[serde(default)]
    pub uid: Option<BondUid>,
    pub name: String,
    pub cusip: String,
    pub original_face: u64,
    #[serde(default)]
    pub classes: Vec<String>,
}

impl BondSpec {
    /// Decode a request payload.
    ///
    /// # Errors
    /// `Encoding` for malformed JSON, `InvalidRequest` for bad values.
    pub fn from_json(payload: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(payload)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Reject blank identifiers and zero face amounts.
    pub fn validate(&self) -> Result<()> {
        if self.cusip.trim().is_empty() {
            return Err(BondtradeError::InvalidRequest {
                reason: "cusip must not be empty".into(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(BondtradeError::InvalidRequest {
                reason: "bond name must not be empty".into(),
            });
        }
        if self.original_face == 0 {
            return Err(BondtradeError::InvalidRequest {
                reason: "original face must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Organization-private data attached to a bond by uid.
///
/// Stored only in the owner's private partition. The uid link is a soft
/// reference: the public bond may since have been deleted or transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateBondExtension {
    pub uid: BondUid,
    pub reserve_price: Decimal,
}

/// A public bond paired with the caller's private extension, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondHolding {
    pub bond: Bond,
    pub private: Option<PrivateBondExtension>,
}

impl BondHolding {
    /// Reserve price from the private half, if the caller has one.
    #[must_use]
    pub fn reserve_price(&self) -> Option<Decimal> {
        self.private.as_ref().map(|p| p.reserve_price)
    }
}

/// Who staged an inventory bond, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub owner: OrgId,
    /// Identity token of the client that staged the bond.
    pub owner_id: String,
    pub date_created: DateTime<Utc>,
}

impl AssetMetadata {
    #[must_use]
    pub fn stamp(caller: &CallerIdentity, at: DateTime<Utc>) -> Self {
        Self {
            owner: caller.org.clone(),
            owner_id: caller.identity_token.clone(),
            date_created: at,
        }
    }
}

/// A bond staged in an organization's private inventory, not yet on the
/// ledger. Keyed by CUSIP within the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryBond {
    pub metadata: AssetMetadata,
    pub bond: BondSpec,
}
