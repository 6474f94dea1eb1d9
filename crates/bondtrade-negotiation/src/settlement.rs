//! Settlement of a mutually accepted answer.
//!
//! Settlement is a pure edit of a [`TradeLedger`] copy: reassign the
//! seller's bond to the bidder, close the trade, append the
//! [`Transaction`]. The caller commits the copy in one document write, so
//! either all three changes land or none do.

use bondtrade_types::{
    BondtradeError, DirectTradeId, OwnerHash, Result, TradeLedger, Transaction,
};
use chrono::{DateTime, Utc};

/// Settle `trade_id` against the answer slot of `seller`.
///
/// # Errors
/// - `TradeNotFound` / `TradeClosed` if the trade is missing or terminal
/// - `SettlementFailed` if the answer is not a mutual "yes" or the seller
///   no longer holds a bond in the trade's CUSIP
///
/// On error the ledger is left untouched.
pub fn settle(
    ledger: &mut TradeLedger,
    trade_id: DirectTradeId,
    seller: &OwnerHash,
    at: DateTime<Utc>,
) -> Result<Transaction> {
    let trade = ledger.trade(trade_id)?;
    trade.ensure_open()?;

    let answer = trade.answer(seller).ok_or_else(|| failed(format!(
        "no answer from seller {} on {trade_id}",
        seller.short()
    )))?;
    if !answer.is_mutual_yes() {
        return Err(failed(format!(
            "answer from {} on {trade_id} is not a mutual yes",
            seller.short()
        )));
    }

    let bond_uid = ledger
        .position_of(seller, &trade.cusip, trade.original_face)
        .ok_or_else(|| failed(format!(
            "seller {} holds no bond in {}",
            seller.short(),
            trade.cusip
        )))?;

    let tx = Transaction::settle(trade, answer, bond_uid, at);
    let bidder = trade.bidder_hash.clone();

    // All checks passed; apply the three edits.
    ledger.bond_mut(bond_uid)?.owner_hash = bidder;
    ledger.trade_mut(trade_id)?.close()?;
    ledger.transactions.push(tx.clone());

    tracing::info!(
        trade = %trade_id,
        bond = %bond_uid,
        cusip = %tx.cusip,
        price = %tx.bought_price,
        notional = %tx.notional(),
        "Trade settled"
    );
    Ok(tx)
}

fn failed(reason: String) -> BondtradeError {
    BondtradeError::SettlementFailed { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bondtrade_types::{fixtures, Bond, DirectTrade, ResponseValue, TradeState};
    use rust_decimal::Decimal;

    struct Setup {
        ledger: TradeLedger,
        trade_id: DirectTradeId,
        seller: OwnerHash,
        bidder: OwnerHash,
    }

    fn setup(seller_value: ResponseValue, buyer_value: ResponseValue) -> Setup {
        let now = Utc::now();
        let seller = OwnerHash::new("seller-hash");
        let bidder = OwnerHash::new("bidder-hash");
        let mut ledger = TradeLedger::new();
        ledger
            .bonds
            .push(Bond::from_spec(fixtures::bond_spec("US123", 1000), seller.clone()));
        let mut trade = DirectTrade::open("US123", 1000, Decimal::new(995, 1), bidder.clone(), now);
        let answer = trade.answer_mut(&seller);
        answer.record_seller(seller_value, now);
        answer.record_buyer(buyer_value, now);
        let trade_id = trade.id;
        ledger.trades.push(trade);
        Setup {
            ledger,
            trade_id,
            seller,
            bidder,
        }
    }

    #[test]
    fn mutual_yes_moves_bond_and_closes_trade() {
        let mut s = setup(ResponseValue::Yes, ResponseValue::Yes);
        let tx = settle(&mut s.ledger, s.trade_id, &s.seller, Utc::now()).unwrap();

        assert_eq!(s.ledger.bonds[0].owner_hash, s.bidder);
        assert_eq!(s.ledger.trades[0].state, TradeState::Closed);
        assert_eq!(s.ledger.transactions, vec![tx.clone()]);
        assert_eq!(tx.seller_pseudo_id, s.seller);
        assert_eq!(tx.buyer_pseudo_id, s.bidder);
        assert_eq!(tx.bought_price, Decimal::new(995, 1));
        s.ledger.verify_invariants().unwrap();
    }

    #[test]
    fn not_mutual_yes_is_rejected_untouched() {
        let mut s = setup(ResponseValue::Yes, ResponseValue::Counter);
        let before = s.ledger.clone();
        let err = settle(&mut s.ledger, s.trade_id, &s.seller, Utc::now()).unwrap_err();
        assert!(matches!(err, BondtradeError::SettlementFailed { .. }));
        assert_eq!(s.ledger, before);
    }

    #[test]
    fn missing_position_is_rejected_untouched() {
        let mut s = setup(ResponseValue::Yes, ResponseValue::Yes);
        s.ledger.bonds.clear();
        let before = s.ledger.clone();
        let err = settle(&mut s.ledger, s.trade_id, &s.seller, Utc::now()).unwrap_err();
        assert!(matches!(err, BondtradeError::SettlementFailed { .. }));
        assert_eq!(s.ledger, before);
    }

    #[test]
    fn closed_trade_cannot_settle_twice() {
        let mut s = setup(ResponseValue::Yes, ResponseValue::Yes);
        settle(&mut s.ledger, s.trade_id, &s.seller, Utc::now()).unwrap();
        let err = settle(&mut s.ledger, s.trade_id, &s.seller, Utc::now()).unwrap_err();
        assert!(matches!(err, BondtradeError::TradeClosed(id) if id == s.trade_id));
        assert_eq!(s.ledger.transactions.len(), 1);
    }

    #[test]
    fn prefers_position_with_matching_face() {
        let mut s = setup(ResponseValue::Yes, ResponseValue::Yes);
        let mut other = Bond::from_spec(fixtures::bond_spec("US123", 500), s.seller.clone());
        other.name = "small lot".into();
        s.ledger.bonds.insert(0, other);

        let tx = settle(&mut s.ledger, s.trade_id, &s.seller, Utc::now()).unwrap();
        let moved = s.ledger.bond(tx.bond_uid).unwrap();
        assert_eq!(moved.original_face, 1000);
        assert_eq!(s.ledger.bonds[0].owner_hash, s.seller);
    }
}
