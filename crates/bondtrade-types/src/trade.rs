//! Direct trade negotiation records.
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐  settlement / manual close  ┌────────┐
//!   │ OPEN ├────────────────────────────▶│ CLOSED │
//!   └──────┘                             └────────┘
//! ```
//!
//! Closing is irreversible. While Open, each seller that responds gets one
//! [`Answer`] slot holding the latest seller and buyer responses.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BondtradeError, DirectTradeId, OwnerHash, Result};

/// Lifecycle state of a direct trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeState {
    Open,
    Closed,
}

impl TradeState {
    /// Can this trade move to `target`? Only `Open → Closed` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Open, Self::Closed))
    }
}

impl std::fmt::Display for TradeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// A single party's position in a negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResponseValue {
    /// No response yet, or a response that was invalidated.
    #[default]
    #[serde(rename = "")]
    Empty,
    #[serde(rename = "yes")]
    Yes,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "counter")]
    Counter,
}

impl ResponseValue {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Yes => "yes",
            Self::No => "no",
            Self::Counter => "counter",
        }
    }
}

impl FromStr for ResponseValue {
    type Err = BondtradeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Ok(Self::Empty),
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            "counter" => Ok(Self::Counter),
            other => Err(BondtradeError::Encoding(format!(
                "unknown response value {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for ResponseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Response {
    pub value: ResponseValue,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Response {
    #[must_use]
    pub fn new(value: ResponseValue, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp: Some(timestamp),
        }
    }

    #[must_use]
    pub fn is_yes(&self) -> bool {
        self.value == ResponseValue::Yes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value == ResponseValue::Empty
    }
}

/// One seller's side of a negotiation plus the buyer's reply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub seller_identity_hash: OwnerHash,
    pub seller_response: Response,
    pub buyer_response: Response,
}

impl Answer {
    #[must_use]
    pub fn new(seller_identity_hash: OwnerHash) -> Self {
        Self {
            seller_identity_hash,
            seller_response: Response::default(),
            buyer_response: Response::default(),
        }
    }

    /// Record the seller's position. Any buyer acknowledgment is dropped:
    /// the buyer must re-confirm against the new position.
    pub fn record_seller(&mut self, value: ResponseValue, timestamp: DateTime<Utc>) {
        self.seller_response = Response::new(value, timestamp);
        self.buyer_response = Response::default();
    }

    pub fn record_buyer(&mut self, value: ResponseValue, timestamp: DateTime<Utc>) {
        self.buyer_response = Response::new(value, timestamp);
    }

    /// Both sides said "yes" to the same position.
    #[must_use]
    pub fn is_mutual_yes(&self) -> bool {
        self.seller_response.is_yes() && self.buyer_response.is_yes()
    }
}

/// An offer to buy a position in `cusip`, negotiated bilaterally with
/// every holder who chooses to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectTrade {
    pub id: DirectTradeId,
    pub cusip: String,
    pub original_face: u64,
    pub bid_price: Decimal,
    /// Per-trade pseudonym of the initiating buyer.
    pub bidder_hash: OwnerHash,
    pub state: TradeState,
    /// Input to the bidder pseudonym; never changes after creation.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub answers: BTreeMap<OwnerHash, Answer>,
}

impl DirectTrade {
    /// A fresh Open trade with no answers.
    #[must_use]
    pub fn open(
        cusip: impl Into<String>,
        original_face: u64,
        bid_price: Decimal,
        bidder_hash: OwnerHash,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DirectTradeId::new(),
            cusip: cusip.into(),
            original_face,
            bid_price,
            bidder_hash,
            state: TradeState::Open,
            created_at,
            answers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == TradeState::Open
    }

    /// Guard for every mutation.
    ///
    /// # Errors
    /// [`BondtradeError::TradeClosed`] if the trade is terminal.
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(BondtradeError::TradeClosed(self.id))
        }
    }

    /// Transition to Closed.
    ///
    /// # Errors
    /// [`BondtradeError::TradeClosed`] if already Closed.
    pub fn close(&mut self) -> Result<()> {
        if !self.state.can_transition_to(TradeState::Closed) {
            return Err(BondtradeError::TradeClosed(self.id));
        }
        self.state = TradeState::Closed;
        Ok(())
    }

    #[must_use]
    pub fn answer(&self, seller: &OwnerHash) -> Option<&Answer> {
        self.answers.get(seller)
    }

    /// The answer slot for `seller`, created empty on first use.
    pub fn answer_mut(&mut self, seller: &OwnerHash) -> &mut Answer {
        self.answers
            .entry(seller.clone())
            .or_insert_with(|| Answer::new(seller.clone()))
    }
}

impl std::fmt::Display for DirectTrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DirectTrade[{}] {} face={} bid={} {} answers={}",
            self.id,
            self.cusip,
            self.original_face,
            self.bid_price,
            self.state,
            self.answers.len()
        )
    }
}
