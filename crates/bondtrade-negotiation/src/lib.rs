//! # bondtrade-negotiation
//!
//! Bilateral direct-trade negotiation and atomic settlement.
//!
//! ## Architecture
//!
//! A buyer opens a [`DirectTrade`](bondtrade_types::DirectTrade) bidding for
//! a CUSIP. Any holder of that CUSIP may answer as seller; the buyer answers
//! back on that seller's slot. When both sides say "yes":
//! 1. The seller's bond is reassigned to the buyer's per-trade pseudonym
//! 2. The trade is closed
//! 3. A [`Transaction`](bondtrade_types::Transaction) is appended
//!
//! All three land in a single versioned write of the ledger document, or
//! not at all.
//!
//! - [`TradeNegotiationEngine`]: the negotiation state machine
//! - [`settle`]: the pure settlement step
//! - [`RetryCoordinator`]: bounded repetition on store version conflicts
//! - [`BondTradeService`]: the full operation surface

pub mod engine;
pub mod retry;
pub mod service;
pub mod settlement;

pub use engine::{AnswerOutcome, TradeNegotiationEngine};
pub use retry::RetryCoordinator;
pub use service::BondTradeService;
pub use settlement::settle;
