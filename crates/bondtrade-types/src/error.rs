//! Error types for BondTrade.
//!
//! All errors use the `BT_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Bond / registry errors
//! - 2xx: Direct trade errors
//! - 3xx: Settlement errors
//! - 4xx: Identity / authorization errors
//! - 5xx: Store errors
//! - 9xx: Encoding / general errors

use thiserror::Error;

use crate::{BondUid, DirectTradeId, OrgId};

/// Central error enum for all BondTrade operations.
#[derive(Debug, Error)]
pub enum BondtradeError {
    // =================================================================
    // Bond Errors (1xx)
    // =================================================================
    /// No bond with this uid exists on the ledger.
    #[error("BT_ERR_100: Bond not found: {0}")]
    BondNotFound(BondUid),

    /// No bond with this CUSIP exists on the ledger.
    #[error("BT_ERR_101: No bonds found for CUSIP {0}")]
    CusipNotFound(String),

    /// A bond with the same natural key is already on the ledger.
    #[error("BT_ERR_102: Duplicate asset: {key}")]
    DuplicateAsset { key: String },

    /// The caller's private partition holds no extension for this bond.
    #[error("BT_ERR_103: Private bond data not found: {0}")]
    PrivateBondNotFound(BondUid),

    /// The caller's private inventory holds no bond with this CUSIP.
    #[error("BT_ERR_104: No inventory bond with CUSIP {0}")]
    InventoryBondNotFound(String),

    // =================================================================
    // Direct Trade Errors (2xx)
    // =================================================================
    /// No direct trade with this id exists on the ledger.
    #[error("BT_ERR_200: Direct trade not found: {0}")]
    TradeNotFound(DirectTradeId),

    /// The trade is Closed and can no longer be mutated.
    #[error("BT_ERR_201: Direct trade is closed: {0}")]
    TradeClosed(DirectTradeId),

    /// The initiator of a trade tried to answer it as a seller.
    #[error("BT_ERR_202: Self-trade prevented on {0}")]
    SelfTradeBlocked(DirectTradeId),

    // =================================================================
    // Settlement Errors (3xx)
    // =================================================================
    /// Mutual agreement was reached but settlement could not be applied.
    #[error("BT_ERR_300: Settlement failed: {reason}")]
    SettlementFailed { reason: String },

    /// The ledger document violates a structural invariant.
    #[error("BT_ERR_301: Ledger invariant violation: {reason}")]
    InvariantViolation { reason: String },

    // =================================================================
    // Identity Errors (4xx)
    // =================================================================
    /// Ownership or initiator check failed.
    #[error("BT_ERR_400: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The organization has not stored a secret in its private partition.
    #[error("BT_ERR_401: No secret set for organization {0}")]
    SecretNotFound(OrgId),

    // =================================================================
    // Store Errors (5xx)
    // =================================================================
    /// The ledger document changed since it was read. Retry the operation.
    #[error("BT_ERR_500: Store conflict on {key}: expected version {expected}, found {actual}")]
    StoreConflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// The backing store failed.
    #[error("BT_ERR_501: Store error: {0}")]
    Store(String),

    // =================================================================
    // Encoding / General (9xx)
    // =================================================================
    /// A request payload or stored document could not be decoded.
    #[error("BT_ERR_900: Encoding error: {0}")]
    Encoding(String),

    /// A request decoded fine but carries invalid values.
    #[error("BT_ERR_901: Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("BT_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Unrecoverable internal error.
    #[error("BT_ERR_903: Internal error: {0}")]
    Internal(String),
}

impl BondtradeError {
    /// Whether the whole read-modify-write may be repeated.
    ///
    /// Only version conflicts qualify; everything else is terminal for
    /// the invocation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreConflict { .. })
    }

    /// Shorthand for [`BondtradeError::Unauthorized`].
    #[must_use]
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BondtradeError>;

impl From<serde_json::Error> for BondtradeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
