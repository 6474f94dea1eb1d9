//! # bondtrade-types
//!
//! Shared types, errors, and configuration for **BondTrade**.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`BondUid`], [`DirectTradeId`], [`OrgId`], [`OwnerHash`]
//! - **Bond model**: [`Bond`], [`BondSpec`], [`PrivateBondExtension`], [`BondHolding`],
//!   [`InventoryBond`], [`AssetMetadata`]
//! - **Negotiation model**: [`DirectTrade`], [`TradeState`], [`Answer`], [`Response`], [`ResponseValue`]
//! - **Settlement record**: [`Transaction`]
//! - **Ledger aggregate**: [`TradeLedger`]
//! - **Requests**: [`CreateTradeRequest`], [`AnswerRequest`]
//! - **Identity**: [`CallerIdentity`], [`IdentityGateway`]
//! - **Configuration**: [`EngineConfig`], [`TimestampPolicy`], [`Clock`]
//! - **Errors**: [`BondtradeError`] with `BT_ERR_` prefix codes
//! - **Constants**: partition keys and defaults

pub mod bond;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod identity;
pub mod ids;
pub mod ledger;
pub mod request;
pub mod trade;
pub mod transaction;

#[cfg(feature = "test-helpers")]
pub mod fixtures;

pub use bond::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use identity::*;
pub use ids::*;
pub use ledger::*;
pub use request::*;
pub use trade::*;
pub use transaction::*;

// Constants are accessed via `bondtrade_types::constants::FOO`
// (not re-exported to avoid name collisions).
