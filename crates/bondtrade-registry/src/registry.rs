//! Public bond records and their private reserve-price extensions.
//!
//! Creating a bond writes two places: the public [`Bond`] goes into the
//! ledger document, and a [`PrivateBondExtension`] with the reserve price
//! goes into the creator's private partition. The reserve price is passed
//! as a transient argument and never touches the ledger.
//!
//! An organization may also stage bonds in a private inventory and publish
//! them later by CUSIP.

use std::sync::Arc;

use bondtrade_store::{LedgerRepository, PrivatePartition, PrivateStore};
use bondtrade_types::{
    AssetMetadata, Bond, BondHolding, BondSpec, BondUid, BondtradeError, CallerIdentity,
    InventoryBond, PrivateBondExtension, Result, Transaction,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::private_bonds::PrivateBondBook;
use crate::private_inventory::PrivateInventory;
use crate::verifier::OwnershipVerifier;

/// Create, read, edit and delete bonds.
#[derive(Clone)]
pub struct BondRegistry {
    repo: LedgerRepository,
    private: Arc<dyn PrivateStore>,
    verifier: OwnershipVerifier,
}

impl BondRegistry {
    #[must_use]
    pub fn new(
        repo: LedgerRepository,
        private: Arc<dyn PrivateStore>,
        verifier: OwnershipVerifier,
    ) -> Self {
        Self {
            repo,
            private,
            verifier,
        }
    }

    fn book<'a>(&'a self, caller: &'a CallerIdentity) -> PrivateBondBook<'a> {
        PrivateBondBook::new(PrivatePartition::for_caller(self.private.as_ref(), caller))
    }

    /// Register a new bond owned by the caller.
    ///
    /// # Errors
    /// - `InvalidRequest` for a bad spec or negative reserve price
    /// - `SecretNotFound` if the caller has no secret
    /// - `DuplicateAsset` if the uid is taken, or the caller already
    ///   registered a bond with this CUSIP
    /// - `Store` if either store fails
    ///
    /// On any ledger failure the caller's private extensions are left as
    /// they were before the call.
    pub fn create_bond(
        &self,
        caller: &CallerIdentity,
        spec: BondSpec,
        reserve_price: Decimal,
    ) -> Result<BondUid> {
        spec.validate()?;
        validate_reserve_price(reserve_price)?;
        let owner_hash = self.verifier.derive_owner_hash(caller, None)?;

        let bond = Bond::from_spec(spec, owner_hash);
        let uid = bond.uid;
        let cusip = bond.cusip.clone();

        // Private side first. Reads already tolerate a dangling extension.
        let book = self.book(caller);
        let previous = book.get(uid)?;
        book.upsert(PrivateBondExtension { uid, reserve_price })?;

        let committed = self.repo.transact(|ledger| {
            if ledger.bond(uid).is_some() {
                return Err(BondtradeError::DuplicateAsset {
                    key: uid.to_string(),
                });
            }
            if ledger
                .bonds_by_cusip(&bond.cusip)
                .any(|b| b.owner_hash == bond.owner_hash)
            {
                return Err(BondtradeError::DuplicateAsset {
                    key: format!("{}/{}", bond.cusip, bond.owner_hash.short()),
                });
            }
            ledger.bonds.push(bond);
            Ok(())
        });

        if let Err(err) = committed {
            let undo = match previous {
                Some(ext) => book.upsert(ext),
                None => book.remove(uid).map(|_| ()),
            };
            if let Err(undo_err) = undo {
                tracing::warn!(org = %caller.org, %uid, error = %undo_err, "Reserve price rollback failed");
            }
            return Err(err);
        }

        tracing::info!(org = %caller.org, %uid, cusip = %cusip, "Bond created");
        Ok(uid)
    }

    /// Every bond in `cusip`, each with the caller's private extension if
    /// the caller has one.
    ///
    /// # Errors
    /// `CusipNotFound` if no bond has this CUSIP.
    pub fn get_bond(&self, caller: &CallerIdentity, cusip: &str) -> Result<Vec<BondHolding>> {
        let snapshot = self.repo.load()?;
        let book = self.book(caller);
        let holdings = snapshot
            .ledger
            .bonds_by_cusip(cusip)
            .map(|bond| -> Result<BondHolding> {
                Ok(BondHolding {
                    private: book.get(bond.uid)?,
                    bond: bond.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if holdings.is_empty() {
            return Err(BondtradeError::CusipNotFound(cusip.to_string()));
        }
        tracing::debug!(org = %caller.org, cusip, found = holdings.len(), "Bond lookup");
        Ok(holdings)
    }

    pub fn get_all_bonds(&self) -> Result<Vec<Bond>> {
        Ok(self.repo.load()?.ledger.bonds)
    }

    pub fn get_all_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.repo.load()?.ledger.transactions)
    }

    /// Bonds the caller holds, under its base hash or a bought-under
    /// pseudonym, each with its private extension.
    pub fn get_all_your_bonds(&self, caller: &CallerIdentity) -> Result<Vec<BondHolding>> {
        let snapshot = self.repo.load()?;
        let known = self.verifier.known_hashes(&snapshot.ledger, caller)?;
        let book = self.book(caller);
        snapshot
            .ledger
            .bonds
            .into_iter()
            .filter(|b| known.holds(&b.owner_hash))
            .map(|bond| -> Result<BondHolding> {
                Ok(BondHolding {
                    private: book.get(bond.uid)?,
                    bond,
                })
            })
            .collect()
    }

    /// Replace the descriptive fields of a bond the caller holds.
    ///
    /// The uid and owner hash are kept.
    ///
    /// # Errors
    /// - `BondNotFound` if `uid` is not on the ledger
    /// - `Unauthorized` if the caller does not hold it
    /// - `InvalidRequest` if `spec` names a different uid
    pub fn edit_bond(&self, caller: &CallerIdentity, uid: BondUid, spec: BondSpec) -> Result<()> {
        spec.validate()?;
        if spec.uid.is_some_and(|u| u != uid) {
            return Err(BondtradeError::InvalidRequest {
                reason: format!("spec uid does not match bond {uid}"),
            });
        }

        self.repo.transact(|ledger| {
            let known = self.verifier.known_hashes(ledger, caller)?;
            let owner_hash = ledger
                .bond(uid)
                .map(|b| b.owner_hash.clone())
                .ok_or(BondtradeError::BondNotFound(uid))?;
            if !known.holds(&owner_hash) {
                tracing::warn!(org = %caller.org, %uid, "Edit rejected: not the holder");
                return Err(BondtradeError::unauthorized(format!(
                    "caller does not hold bond {uid}"
                )));
            }
            if ledger
                .bonds_by_cusip(&spec.cusip)
                .any(|b| b.uid != uid && b.owner_hash == owner_hash)
            {
                return Err(BondtradeError::DuplicateAsset {
                    key: format!("{}/{}", spec.cusip, owner_hash.short()),
                });
            }

            let bond = ledger.bond_mut(uid)?;
            bond.name = spec.name;
            bond.cusip = spec.cusip;
            bond.original_face = spec.original_face;
            bond.classes = spec.classes;
            Ok(())
        })?;

        tracing::info!(org = %caller.org, %uid, "Bond edited");
        Ok(())
    }

    /// Remove a bond the caller holds, along with the caller's extension.
    ///
    /// # Errors
    /// `BondNotFound` / `Unauthorized` as for [`Self::edit_bond`].
    pub fn delete_bond(&self, caller: &CallerIdentity, uid: BondUid) -> Result<()> {
        self.repo.transact(|ledger| {
            let known = self.verifier.known_hashes(ledger, caller)?;
            let bond = ledger.bond(uid).ok_or(BondtradeError::BondNotFound(uid))?;
            if !known.holds(&bond.owner_hash) {
                tracing::warn!(org = %caller.org, %uid, "Delete rejected: not the holder");
                return Err(BondtradeError::unauthorized(format!(
                    "caller does not hold bond {uid}"
                )));
            }
            ledger.remove_bond(uid)?;
            Ok(())
        })?;

        self.book(caller).remove(uid)?;
        tracing::info!(org = %caller.org, %uid, "Bond deleted");
        Ok(())
    }

    /// Change the reserve price in the caller's private extension.
    ///
    /// # Errors
    /// `PrivateBondNotFound` if the caller has no extension for `uid`.
    pub fn update_reserve_price(
        &self,
        caller: &CallerIdentity,
        uid: BondUid,
        reserve_price: Decimal,
    ) -> Result<()> {
        validate_reserve_price(reserve_price)?;
        let book = self.book(caller);
        let mut ext = book
            .get(uid)?
            .ok_or(BondtradeError::PrivateBondNotFound(uid))?;
        ext.reserve_price = reserve_price;
        book.upsert(ext)?;
        tracing::debug!(org = %caller.org, %uid, "Reserve price updated");
        Ok(())
    }

    // --- private inventory -------------------------------------------------

    fn inventory<'a>(&'a self, caller: &'a CallerIdentity) -> PrivateInventory<'a> {
        PrivateInventory::new(PrivatePartition::for_caller(self.private.as_ref(), caller))
    }

    pub fn get_inventory(&self, caller: &CallerIdentity) -> Result<Vec<InventoryBond>> {
        self.inventory(caller).all()
    }

    /// Stage a bond in the caller's private inventory without publishing it.
    ///
    /// # Errors
    /// - `InvalidRequest` for a bad spec
    /// - `DuplicateAsset` if the CUSIP is already staged
    pub fn add_to_inventory(
        &self,
        caller: &CallerIdentity,
        spec: BondSpec,
        at: DateTime<Utc>,
    ) -> Result<()> {
        spec.validate()?;
        self.inventory(caller).add(InventoryBond {
            metadata: AssetMetadata::stamp(caller, at),
            bond: spec,
        })
    }

    /// # Errors
    /// `InventoryBondNotFound` if the spec's CUSIP is not staged.
    pub fn edit_bond_in_inventory(&self, caller: &CallerIdentity, spec: BondSpec) -> Result<()> {
        spec.validate()?;
        self.inventory(caller).edit(spec)
    }

    /// # Errors
    /// `InventoryBondNotFound` if `cusip` is not staged.
    pub fn remove_from_inventory(&self, caller: &CallerIdentity, cusip: &str) -> Result<()> {
        self.inventory(caller).remove(cusip).map(|_| ())
    }

    /// Publish the staged bond with this CUSIP as a new ledger bond.
    ///
    /// Goes through [`Self::create_bond`], so the owner hash and duplicate
    /// checks are the same. The staged copy stays in the inventory.
    ///
    /// # Errors
    /// `InventoryBondNotFound` if `cusip` is not staged, then anything
    /// [`Self::create_bond`] returns.
    pub fn publish_from_inventory(
        &self,
        caller: &CallerIdentity,
        cusip: &str,
        reserve_price: Decimal,
    ) -> Result<BondUid> {
        let staged = self.inventory(caller).get(cusip)?;
        let uid = self.create_bond(caller, staged.bond, reserve_price)?;
        tracing::info!(org = %caller.org, %uid, cusip, "Inventory bond published");
        Ok(uid)
    }
}

fn validate_reserve_price(price: Decimal) -> Result<()> {
    if price.is_sign_negative() {
        return Err(BondtradeError::InvalidRequest {
            reason: format!("reserve price must not be negative, got {price}"),
        });
    }
    Ok(())
}
