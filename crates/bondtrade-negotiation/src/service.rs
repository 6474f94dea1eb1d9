//! The operation surface exposed to the hosting platform.
//!
//! Each method resolves the caller through an [`IdentityGateway`], then
//! delegates to the registry, the negotiation engine or the verifier.
//! State-changing operations run under the [`RetryCoordinator`], so a lost
//! version race is repeated against a fresh ledger read.

use std::sync::Arc;

use bondtrade_registry::{BondRegistry, OwnershipVerifier};
use bondtrade_store::{LedgerRepository, LedgerStore, PrivateStore};
use bondtrade_types::{
    AnswerRequest, Bond, BondHolding, BondSpec, BondUid, Clock, CreateTradeRequest, DirectTrade,
    DirectTradeId, EngineConfig, IdentityGateway, InventoryBond, OwnerHash, Result, Transaction,
};
use rust_decimal::Decimal;

use crate::engine::{AnswerOutcome, TradeNegotiationEngine};
use crate::retry::RetryCoordinator;

/// Every BondTrade operation behind one handle.
#[derive(Clone)]
pub struct BondTradeService {
    repo: LedgerRepository,
    verifier: OwnershipVerifier,
    registry: BondRegistry,
    engine: TradeNegotiationEngine,
    retry: RetryCoordinator,
    clock: Arc<dyn Clock>,
}

impl BondTradeService {
    /// Wire the service over the given stores.
    ///
    /// # Errors
    /// `Configuration` if `config` is invalid.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        private: Arc<dyn PrivateStore>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let repo = LedgerRepository::new(ledger, config.ledger_key.clone());
        let verifier = OwnershipVerifier::new(private.clone());
        let registry = BondRegistry::new(repo.clone(), private, verifier.clone());
        let engine = TradeNegotiationEngine::new(
            repo.clone(),
            verifier.clone(),
            clock.clone(),
            config.timestamp_policy,
        );
        tracing::debug!(
            ledger_key = %config.ledger_key,
            max_conflict_retries = config.max_conflict_retries,
            policy = ?config.timestamp_policy,
            "BondTrade service ready"
        );
        Ok(Self {
            repo,
            verifier,
            registry,
            engine,
            retry: RetryCoordinator::new(config.max_conflict_retries),
            clock,
        })
    }

    // --- setup -------------------------------------------------------------

    /// Write an empty ledger if none exists. Returns `true` if it wrote.
    pub fn init_ledger(&self) -> Result<bool> {
        self.retry.run("init_ledger", || self.repo.initialize())
    }

    /// Store the caller's secret, or a random one if `secret` is `None`.
    pub fn set_secret(&self, gw: &dyn IdentityGateway, secret: Option<String>) -> Result<()> {
        let caller = gw.caller()?;
        self.verifier.set_secret(&caller, secret)
    }

    /// The caller's base owner hash, the one its bonds are created under.
    pub fn owner_hash(&self, gw: &dyn IdentityGateway) -> Result<OwnerHash> {
        let caller = gw.caller()?;
        self.verifier.derive_owner_hash(&caller, None)
    }

    /// Whether `candidate` is the caller's base owner hash.
    pub fn is_owner(&self, gw: &dyn IdentityGateway, candidate: &OwnerHash) -> Result<bool> {
        let caller = gw.caller()?;
        Ok(self.verifier.is_owner(candidate, &caller))
    }

    // --- bonds -------------------------------------------------------------

    pub fn create_bond(
        &self,
        gw: &dyn IdentityGateway,
        spec: &BondSpec,
        reserve_price: Decimal,
    ) -> Result<BondUid> {
        let caller = gw.caller()?;
        self.retry.run("create_bond", || {
            self.registry.create_bond(&caller, spec.clone(), reserve_price)
        })
    }

    /// [`Self::create_bond`] with the spec given as a JSON payload.
    ///
    /// # Errors
    /// `Encoding` if the payload does not decode.
    pub fn create_bond_from_json(
        &self,
        gw: &dyn IdentityGateway,
        payload: &str,
        reserve_price: Decimal,
    ) -> Result<BondUid> {
        let spec = BondSpec::from_json(payload)?;
        self.create_bond(gw, &spec, reserve_price)
    }

    pub fn edit_bond(&self, gw: &dyn IdentityGateway, uid: BondUid, spec: &BondSpec) -> Result<()> {
        let caller = gw.caller()?;
        self.retry
            .run("edit_bond", || self.registry.edit_bond(&caller, uid, spec.clone()))
    }

    pub fn delete_bond(&self, gw: &dyn IdentityGateway, uid: BondUid) -> Result<()> {
        let caller = gw.caller()?;
        self.retry
            .run("delete_bond", || self.registry.delete_bond(&caller, uid))
    }

    pub fn get_bond(&self, gw: &dyn IdentityGateway, cusip: &str) -> Result<Vec<BondHolding>> {
        let caller = gw.caller()?;
        self.registry.get_bond(&caller, cusip)
    }

    pub fn get_all_bonds(&self) -> Result<Vec<Bond>> {
        self.registry.get_all_bonds()
    }

    pub fn get_all_transactions(&self) -> Result<Vec<Transaction>> {
        self.registry.get_all_transactions()
    }

    pub fn get_all_your_bonds(&self, gw: &dyn IdentityGateway) -> Result<Vec<BondHolding>> {
        let caller = gw.caller()?;
        self.registry.get_all_your_bonds(&caller)
    }

    pub fn update_reserve_price(
        &self,
        gw: &dyn IdentityGateway,
        uid: BondUid,
        reserve_price: Decimal,
    ) -> Result<()> {
        let caller = gw.caller()?;
        self.registry.update_reserve_price(&caller, uid, reserve_price)
    }

    // --- private inventory -------------------------------------------------

    pub fn get_inventory(&self, gw: &dyn IdentityGateway) -> Result<Vec<InventoryBond>> {
        let caller = gw.caller()?;
        self.registry.get_inventory(&caller)
    }

    /// Stage a bond privately, stamped with the host clock.
    pub fn add_to_inventory(&self, gw: &dyn IdentityGateway, spec: &BondSpec) -> Result<()> {
        let caller = gw.caller()?;
        self.registry
            .add_to_inventory(&caller, spec.clone(), self.clock.now())
    }

    /// # Errors
    /// `Encoding` if the payload does not decode.
    pub fn add_to_inventory_from_json(&self, gw: &dyn IdentityGateway, payload: &str) -> Result<()> {
        let spec = BondSpec::from_json(payload)?;
        self.add_to_inventory(gw, &spec)
    }

    pub fn edit_bond_in_inventory(&self, gw: &dyn IdentityGateway, spec: &BondSpec) -> Result<()> {
        let caller = gw.caller()?;
        self.registry.edit_bond_in_inventory(&caller, spec.clone())
    }

    pub fn remove_from_inventory(&self, gw: &dyn IdentityGateway, cusip: &str) -> Result<()> {
        let caller = gw.caller()?;
        self.registry.remove_from_inventory(&caller, cusip)
    }

    /// Publish a staged bond to the ledger under the caller's owner hash.
    pub fn from_inventory_to_ledger(
        &self,
        gw: &dyn IdentityGateway,
        cusip: &str,
        reserve_price: Decimal,
    ) -> Result<BondUid> {
        let caller = gw.caller()?;
        self.retry.run("from_inventory_to_ledger", || {
            self.registry
                .publish_from_inventory(&caller, cusip, reserve_price)
        })
    }

    // --- direct trades -----------------------------------------------------

    pub fn create_trade(
        &self,
        gw: &dyn IdentityGateway,
        req: &CreateTradeRequest,
    ) -> Result<DirectTradeId> {
        let caller = gw.caller()?;
        self.retry
            .run("create_trade", || self.engine.create_trade(&caller, req))
    }

    pub fn submit_seller_answer(&self, gw: &dyn IdentityGateway, req: &AnswerRequest) -> Result<()> {
        let caller = gw.caller()?;
        self.retry.run("submit_seller_answer", || {
            self.engine.submit_seller_answer(&caller, req)
        })
    }

    pub fn submit_buyer_answer(
        &self,
        gw: &dyn IdentityGateway,
        req: &AnswerRequest,
    ) -> Result<AnswerOutcome> {
        let caller = gw.caller()?;
        self.retry.run("submit_buyer_answer", || {
            self.engine.submit_buyer_answer(&caller, req)
        })
    }

    pub fn close_direct_trade(&self, gw: &dyn IdentityGateway, trade_id: DirectTradeId) -> Result<()> {
        let caller = gw.caller()?;
        self.retry.run("close_direct_trade", || {
            self.engine.close_direct_trade(&caller, trade_id)
        })
    }

    pub fn check_direct_trades(&self, cusip: &str) -> Result<Vec<DirectTrade>> {
        self.engine.check_direct_trades(cusip)
    }

    pub fn get_your_direct_trades(&self, gw: &dyn IdentityGateway) -> Result<Vec<DirectTrade>> {
        let caller = gw.caller()?;
        self.engine.get_your_direct_trades(&caller)
    }

    pub fn get_trade(&self, trade_id: DirectTradeId) -> Result<DirectTrade> {
        self.engine.get_trade(trade_id)
    }
}
