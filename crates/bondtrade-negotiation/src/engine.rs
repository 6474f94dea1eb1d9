//! Direct trade negotiation.
//!
//! ## Flow
//!
//! ```text
//! buyer:  create_trade ──▶ trade Open, bidder pseudonym recorded
//! seller: submit_seller_answer ──▶ answer[seller].seller = v, buyer reset
//! buyer:  submit_buyer_answer  ──▶ answer[seller].buyer  = v
//!                                     │ both "yes"
//!                                     ▼
//!                                settle ──▶ bond → bidder, trade Closed,
//!                                           transaction appended
//! ```
//!
//! Every method is one `load → check → mutate copy → commit` attempt. A
//! commit that loses a race fails with `StoreConflict` and leaves nothing
//! behind; repeating the call re-reads the ledger and re-checks everything.

use std::sync::Arc;

use bondtrade_registry::{KnownHashes, OwnershipVerifier};
use bondtrade_store::LedgerRepository;
use bondtrade_types::{
    AnswerRequest, BondtradeError, CallerIdentity, Clock, CreateTradeRequest, DirectTrade,
    DirectTradeId, Result, TimestampPolicy, TradeLedger, Transaction,
};

use crate::settlement;

/// What a buyer answer led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The response was stored; the negotiation continues.
    Recorded,
    /// Both sides said "yes" and the trade settled.
    Settled(Transaction),
}

/// Runs the `Open → Closed` lifecycle of direct trades.
#[derive(Clone)]
pub struct TradeNegotiationEngine {
    repo: LedgerRepository,
    verifier: OwnershipVerifier,
    clock: Arc<dyn Clock>,
    policy: TimestampPolicy,
}

impl TradeNegotiationEngine {
    #[must_use]
    pub fn new(
        repo: LedgerRepository,
        verifier: OwnershipVerifier,
        clock: Arc<dyn Clock>,
        policy: TimestampPolicy,
    ) -> Self {
        Self {
            repo,
            verifier,
            clock,
            policy,
        }
    }

    /// Open a trade bidding for `req.cusip`.
    ///
    /// The bidder is recorded under a pseudonym bound to the trade's
    /// creation time, so nobody else can link the bid to the caller.
    ///
    /// # Errors
    /// - `InvalidRequest` for an empty CUSIP or non-positive face or bid
    /// - `SecretNotFound` if the caller has no secret
    pub fn create_trade(
        &self,
        caller: &CallerIdentity,
        req: &CreateTradeRequest,
    ) -> Result<DirectTradeId> {
        req.validate()?;
        let created_at = self.policy.resolve(req.created_at, self.clock.as_ref());
        let bidder_hash = self.verifier.derive_owner_hash(caller, Some(created_at))?;
        let trade = DirectTrade::open(
            req.cusip.clone(),
            req.original_face,
            req.bid_price,
            bidder_hash,
            created_at,
        );
        let id = trade.id;

        self.repo.transact(|ledger| {
            ledger.trades.push(trade);
            Ok(())
        })?;

        tracing::info!(
            org = %caller.org,
            trade = %id,
            cusip = %req.cusip,
            face = req.original_face,
            bid = %req.bid_price,
            "Direct trade created"
        );
        Ok(id)
    }

    /// Record a seller's position on a trade.
    ///
    /// `req.seller_identity_hash` must be a hash the caller can prove and
    /// must hold a bond in the trade's CUSIP. Any earlier buyer response on
    /// this answer slot is cleared.
    ///
    /// # Errors
    /// - `TradeNotFound` / `TradeClosed`
    /// - `SelfTradeBlocked` if the caller initiated the trade
    /// - `Unauthorized` if the caller holds no bond in the CUSIP under
    ///   `req.seller_identity_hash`
    pub fn submit_seller_answer(&self, caller: &CallerIdentity, req: &AnswerRequest) -> Result<()> {
        req.validate()?;
        let at = self.policy.resolve(req.timestamp, self.clock.as_ref());
        let seller = &req.seller_identity_hash;

        self.repo.transact(|ledger| {
            let known = self.authorizing_hashes(ledger, caller)?;
            let trade = ledger.trade(req.trade_id)?;
            trade.ensure_open()?;

            if known.as_ref().is_some_and(|k| k.is_bidder(trade)) {
                tracing::warn!(org = %caller.org, trade = %trade.id, "Seller answer rejected: self-trade");
                return Err(BondtradeError::SelfTradeBlocked(trade.id));
            }
            let holds_position = known.as_ref().is_some_and(|k| k.holds(seller))
                && ledger
                    .bonds_by_cusip(&trade.cusip)
                    .any(|b| &b.owner_hash == seller);
            if !holds_position {
                tracing::warn!(
                    org = %caller.org,
                    trade = %trade.id,
                    cusip = %trade.cusip,
                    "Seller answer rejected: no position"
                );
                return Err(BondtradeError::unauthorized(format!(
                    "caller holds no {} position under {}",
                    trade.cusip,
                    seller.short()
                )));
            }

            ledger
                .trade_mut(req.trade_id)?
                .answer_mut(seller)
                .record_seller(req.value, at);
            Ok(())
        })?;

        tracing::debug!(
            org = %caller.org,
            trade = %req.trade_id,
            seller = %seller.short(),
            value = %req.value,
            "Seller answer recorded"
        );
        Ok(())
    }

    /// Record the initiator's response to one seller's answer, settling the
    /// trade if both sides now say "yes".
    ///
    /// # Errors
    /// - `TradeNotFound`
    /// - `Unauthorized` if the caller did not initiate the trade, whether
    ///   the trade is Open or Closed
    /// - `TradeClosed` if the initiator calls on a Closed trade
    /// - `SettlementFailed` if agreement was reached but the seller no longer
    ///   holds a position; nothing is written in that case
    pub fn submit_buyer_answer(
        &self,
        caller: &CallerIdentity,
        req: &AnswerRequest,
    ) -> Result<AnswerOutcome> {
        req.validate()?;
        let at = self.policy.resolve(req.timestamp, self.clock.as_ref());
        let seller = &req.seller_identity_hash;

        let outcome = self.repo.transact(|ledger| {
            let known = self.authorizing_hashes(ledger, caller)?;
            let trade = ledger.trade(req.trade_id)?;
            ensure_bidder(known.as_ref(), trade, caller)?;
            trade.ensure_open()?;

            let answer = ledger.trade_mut(req.trade_id)?.answer_mut(seller);
            answer.record_buyer(req.value, at);
            if answer.is_mutual_yes() {
                settlement::settle(ledger, req.trade_id, seller, at).map(AnswerOutcome::Settled)
            } else {
                Ok(AnswerOutcome::Recorded)
            }
        })?;

        tracing::debug!(
            org = %caller.org,
            trade = %req.trade_id,
            seller = %seller.short(),
            value = %req.value,
            settled = matches!(outcome, AnswerOutcome::Settled(_)),
            "Buyer answer recorded"
        );
        Ok(outcome)
    }

    /// Withdraw an Open trade without settling it.
    ///
    /// # Errors
    /// - `TradeNotFound`
    /// - `Unauthorized` if the caller did not initiate the trade, whether
    ///   the trade is Open or Closed
    /// - `TradeClosed` if the initiator calls on a Closed trade
    pub fn close_direct_trade(&self, caller: &CallerIdentity, trade_id: DirectTradeId) -> Result<()> {
        self.repo.transact(|ledger| {
            let known = self.authorizing_hashes(ledger, caller)?;
            let trade = ledger.trade(trade_id)?;
            ensure_bidder(known.as_ref(), trade, caller)?;
            trade.ensure_open()?;
            ledger.trade_mut(trade_id)?.close()
        })?;

        tracing::info!(org = %caller.org, trade = %trade_id, "Direct trade closed");
        Ok(())
    }

    /// Open trades bidding for `cusip`.
    pub fn check_direct_trades(&self, cusip: &str) -> Result<Vec<DirectTrade>> {
        let snapshot = self.repo.load()?;
        let open: Vec<DirectTrade> = snapshot.ledger.open_trades(cusip).cloned().collect();
        tracing::debug!(cusip, open = open.len(), "Open trades listed");
        Ok(open)
    }

    /// Every trade the caller initiated, Open or Closed.
    ///
    /// # Errors
    /// `SecretNotFound` if the caller has no secret.
    pub fn get_your_direct_trades(&self, caller: &CallerIdentity) -> Result<Vec<DirectTrade>> {
        let snapshot = self.repo.load()?;
        let known = self.verifier.known_hashes(&snapshot.ledger, caller)?;
        Ok(snapshot
            .ledger
            .trades
            .into_iter()
            .filter(|t| known.is_bidder(t))
            .collect())
    }

    /// A single trade by id.
    ///
    /// # Errors
    /// `TradeNotFound` if no trade has this id.
    pub fn get_trade(&self, trade_id: DirectTradeId) -> Result<DirectTrade> {
        self.repo.load()?.ledger.trade(trade_id).cloned()
    }

    /// The caller's hashes for authorization checks. A caller without a
    /// secret can prove nothing, which makes every check fail as
    /// `Unauthorized` rather than surfacing the missing secret.
    fn authorizing_hashes(
        &self,
        ledger: &TradeLedger,
        caller: &CallerIdentity,
    ) -> Result<Option<KnownHashes>> {
        match self.verifier.known_hashes(ledger, caller) {
            Ok(known) => Ok(Some(known)),
            Err(BondtradeError::SecretNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn ensure_bidder(
    known: Option<&KnownHashes>,
    trade: &DirectTrade,
    caller: &CallerIdentity,
) -> Result<()> {
    if known.is_some_and(|k| k.is_bidder(trade)) {
        return Ok(());
    }
    tracing::warn!(org = %caller.org, trade = %trade.id, "Rejected: caller is not the initiator");
    Err(BondtradeError::unauthorized(format!(
        "caller did not initiate {}",
        trade.id
    )))
}
