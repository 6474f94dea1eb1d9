//! Settled trade records.
//!
//! A [`Transaction`] is appended exactly once, when a direct trade settles,
//! and never mutated afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Answer, BondUid, DirectTrade, DirectTradeId, OwnerHash};

/// Immutable record of a completed ownership transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The direct trade this transaction settled.
    pub trade_id: DirectTradeId,
    /// The bond whose ownership moved.
    pub bond_uid: BondUid,
    /// Buyer's per-trade pseudonym.
    pub buyer_pseudo_id: OwnerHash,
    /// Seller's identity hash as given in the accepted answer.
    pub seller_pseudo_id: OwnerHash,
    pub cusip: String,
    pub original_face: u64,
    pub bought_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Record the settlement of `answer` on `trade` against bond `bond_uid`.
    #[must_use]
    pub fn settle(
        trade: &DirectTrade,
        answer: &Answer,
        bond_uid: BondUid,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            trade_id: trade.id,
            bond_uid,
            buyer_pseudo_id: trade.bidder_hash.clone(),
            seller_pseudo_id: answer.seller_identity_hash.clone(),
            cusip: trade.cusip.clone(),
            original_face: trade.original_face,
            bought_price: trade.bid_price,
            timestamp,
        }
    }

    /// Cash amount of the transaction: `original_face × bought_price / 100`.
    ///
    /// Prices are quoted per 100 of face.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        Decimal::from(self.original_face) * self.bought_price / Decimal::ONE_HUNDRED
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Transaction[{}] {} face={} @ {} {} -> {}",
            self.trade_id,
            self.cusip,
            self.original_face,
            self.bought_price,
            self.seller_pseudo_id.short(),
            self.buyer_pseudo_id.short(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponseValue;

    #[test]
    fn settle_copies_trade_terms() {
        let now = Utc::now();
        let mut trade = DirectTrade::open(
            "US123",
            1000,
            Decimal::new(995, 1),
            OwnerHash::new("buyer"),
            now,
        );
        let seller = OwnerHash::new("seller");
        trade.answer_mut(&seller).record_seller(ResponseValue::Yes, now);
        let answer = trade.answer(&seller).unwrap();

        let uid = BondUid::new();
        let tx = Transaction::settle(&trade, answer, uid, now);
        assert_eq!(tx.trade_id, trade.id);
        assert_eq!(tx.bond_uid, uid);
        assert_eq!(tx.buyer_pseudo_id, OwnerHash::new("buyer"));
        assert_eq!(tx.seller_pseudo_id, seller);
        assert_eq!(tx.bought_price, Decimal::new(995, 1));
        assert_eq!(tx.notional(), Decimal::new(995, 0));
    }
}
