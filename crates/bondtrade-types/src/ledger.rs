//! The public ledger document.
//!
//! Bonds, direct trades and settled transactions live together in one
//! aggregate stored under a single key. Every mutation reads the whole
//! document, edits an in-memory copy, and writes the whole document back.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    Bond, BondUid, BondtradeError, DirectTrade, DirectTradeId, OwnerHash, Result, Transaction,
};

/// Aggregate root of the public ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLedger {
    #[serde(default)]
    pub bonds: Vec<Bond>,
    #[serde(default)]
    pub trades: Vec<DirectTrade>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl TradeLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- bonds -------------------------------------------------------------

    #[must_use]
    pub fn bond(&self, uid: BondUid) -> Option<&Bond> {
        self.bonds.iter().find(|b| b.uid == uid)
    }

    pub fn bond_mut(&mut self, uid: BondUid) -> Result<&mut Bond> {
        self.bonds
            .iter_mut()
            .find(|b| b.uid == uid)
            .ok_or(BondtradeError::BondNotFound(uid))
    }

    pub fn bonds_by_cusip<'a>(&'a self, cusip: &'a str) -> impl Iterator<Item = &'a Bond> + 'a {
        self.bonds.iter().filter(move |b| b.is_cusip(cusip))
    }

    /// Remove a bond by uid and return it.
    pub fn remove_bond(&mut self, uid: BondUid) -> Result<Bond> {
        let idx = self
            .bonds
            .iter()
            .position(|b| b.uid == uid)
            .ok_or(BondtradeError::BondNotFound(uid))?;
        Ok(self.bonds.remove(idx))
    }

    /// A bond in `cusip` currently recorded under `owner`.
    ///
    /// Prefers a position whose face matches `face` exactly; otherwise the
    /// first one in ledger order.
    #[must_use]
    pub fn position_of(&self, owner: &OwnerHash, cusip: &str, face: u64) -> Option<BondUid> {
        let mut candidates = self
            .bonds_by_cusip(cusip)
            .filter(|b| &b.owner_hash == owner)
            .peekable();
        let first = candidates.peek().map(|b| b.uid);
        candidates
            .find(|b| b.original_face == face)
            .map(|b| b.uid)
            .or(first)
    }

    // --- trades ------------------------------------------------------------

    pub fn trade(&self, id: DirectTradeId) -> Result<&DirectTrade> {
        self.trades
            .iter()
            .find(|t| t.id == id)
            .ok_or(BondtradeError::TradeNotFound(id))
    }

    pub fn trade_mut(&mut self, id: DirectTradeId) -> Result<&mut DirectTrade> {
        self.trades
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(BondtradeError::TradeNotFound(id))
    }

    pub fn open_trades<'a>(&'a self, cusip: &'a str) -> impl Iterator<Item = &'a DirectTrade> + 'a {
        self.trades
            .iter()
            .filter(move |t| t.cusip == cusip && t.is_open())
    }

    // --- invariants --------------------------------------------------------

    /// Structural checks run before every commit:
    /// - bond uids and trade ids are unique
    /// - every transaction references an existing, Closed trade
    /// - no trade is settled more than once
    ///
    /// # Errors
    /// [`BondtradeError::InvariantViolation`] describing the first breach.
    pub fn verify_invariants(&self) -> Result<()> {
        let mut uids = HashSet::with_capacity(self.bonds.len());
        for bond in &self.bonds {
            if !uids.insert(bond.uid) {
                return Err(violation(format!("duplicate bond uid {}", bond.uid)));
            }
        }

        let mut trade_ids = HashSet::with_capacity(self.trades.len());
        for trade in &self.trades {
            if !trade_ids.insert(trade.id) {
                return Err(violation(format!("duplicate trade id {}", trade.id)));
            }
        }

        let mut settled = HashSet::with_capacity(self.transactions.len());
        for tx in &self.transactions {
            let trade = self.trade(tx.trade_id).map_err(|_| {
                violation(format!("transaction references unknown trade {}", tx.trade_id))
            })?;
            if trade.is_open() {
                return Err(violation(format!(
                    "transaction references open trade {}",
                    tx.trade_id
                )));
            }
            if !settled.insert(tx.trade_id) {
                return Err(violation(format!("trade {} settled twice", tx.trade_id)));
            }
        }
        Ok(())
    }
}

fn violation(reason: String) -> BondtradeError {
    BondtradeError::InvariantViolation { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BondSpec, ResponseValue};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn bond(cusip: &str, face: u64, owner: &str) -> Bond {
        Bond::from_spec(
            BondSpec {
                uid: None,
                name: "FR RA7777".into(),
                cusip: cusip.into(),
                original_face: face,
                classes: vec![],
            },
            OwnerHash::new(owner),
        )
    }

    fn trade() -> DirectTrade {
        DirectTrade::open("US123", 1000, Decimal::new(995, 1), OwnerHash::new("b"), Utc::now())
    }

    #[test]
    fn lookups() {
        let mut ledger = TradeLedger::new();
        let a = bond("US123", 1000, "a");
        let uid = a.uid;
        ledger.bonds.push(a);
        ledger.bonds.push(bond("US999", 500, "a"));

        assert!(ledger.bond(uid).is_some());
        assert_eq!(ledger.bonds_by_cusip("US123").count(), 1);
        assert!(matches!(
            ledger.bond_mut(BondUid::new()),
            Err(BondtradeError::BondNotFound(_))
        ));
        assert!(matches!(
            ledger.trade(DirectTradeId::new()),
            Err(BondtradeError::TradeNotFound(_))
        ));

        let removed = ledger.remove_bond(uid).unwrap();
        assert_eq!(removed.uid, uid);
        assert!(ledger.bond(uid).is_none());
    }

    #[test]
    fn position_prefers_matching_face() {
        let mut ledger = TradeLedger::new();
        let small = bond("US123", 500, "a");
        let exact = bond("US123", 1000, "a");
        let other_owner = bond("US123", 1000, "z");
        let (small_uid, exact_uid) = (small.uid, exact.uid);
        ledger.bonds.extend([small, exact, other_owner]);

        let owner = OwnerHash::new("a");
        assert_eq!(ledger.position_of(&owner, "US123", 1000), Some(exact_uid));
        assert_eq!(ledger.position_of(&owner, "US123", 42), Some(small_uid));
        assert_eq!(ledger.position_of(&OwnerHash::new("q"), "US123", 1000), None);
    }

    #[test]
    fn open_trades_filters_state_and_cusip() {
        let mut ledger = TradeLedger::new();
        let mut closed = trade();
        closed.close().unwrap();
        ledger.trades.extend([trade(), closed]);
        ledger.trades.push(DirectTrade::open(
            "US999",
            1,
            Decimal::ONE,
            OwnerHash::new("b"),
            Utc::now(),
        ));
        assert_eq!(ledger.open_trades("US123").count(), 1);
    }

    #[test]
    fn invariants_reject_transaction_on_open_trade() {
        let mut ledger = TradeLedger::new();
        let t = trade();
        let seller = OwnerHash::new("s");
        let mut answer = crate::Answer::new(seller);
        answer.record_seller(ResponseValue::Yes, Utc::now());
        ledger
            .transactions
            .push(Transaction::settle(&t, &answer, BondUid::new(), Utc::now()));
        ledger.trades.push(t);

        let err = ledger.verify_invariants().unwrap_err();
        assert!(matches!(err, BondtradeError::InvariantViolation { .. }));

        ledger.trades[0].close().unwrap();
        ledger.verify_invariants().unwrap();

        let dup = ledger.transactions[0].clone();
        ledger.transactions.push(dup);
        assert!(ledger.verify_invariants().is_err());
    }

    #[test]
    fn invariants_reject_duplicate_uids() {
        let mut ledger = TradeLedger::new();
        let b = bond("US123", 1000, "a");
        ledger.bonds.push(b.clone());
        ledger.bonds.push(b);
        assert!(ledger.verify_invariants().is_err());
    }

    #[test]
    fn empty_document_decodes_to_default() {
        let ledger: TradeLedger = serde_json::from_str("{}").unwrap();
        assert_eq!(ledger, TradeLedger::new());
    }
}
