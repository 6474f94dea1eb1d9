//! Bonds an organization has staged privately before publishing them.
//!
//! The inventory is one JSON list under its own private partition key, kept
//! apart from the reserve-price extensions. Entries are keyed by CUSIP.

use bondtrade_store::PrivatePartition;
use bondtrade_types::{constants, BondSpec, BondtradeError, InventoryBond, Result};

/// Read/write view over one organization's staged bonds.
pub struct PrivateInventory<'a> {
    partition: PrivatePartition<'a>,
}

impl<'a> PrivateInventory<'a> {
    #[must_use]
    pub fn new(partition: PrivatePartition<'a>) -> Self {
        Self { partition }
    }

    /// Every staged bond, oldest first. Empty if nothing was ever staged.
    pub fn all(&self) -> Result<Vec<InventoryBond>> {
        Ok(self
            .partition
            .get_json(constants::INVENTORY_KEY)?
            .unwrap_or_default())
    }

    /// # Errors
    /// `InventoryBondNotFound` if nothing is staged under `cusip`.
    pub fn get(&self, cusip: &str) -> Result<InventoryBond> {
        self.all()?
            .into_iter()
            .find(|b| b.bond.cusip == cusip)
            .ok_or_else(|| BondtradeError::InventoryBondNotFound(cusip.to_string()))
    }

    /// Stage a new bond.
    ///
    /// # Errors
    /// `DuplicateAsset` if a bond with the same CUSIP is already staged.
    pub fn add(&self, staged: InventoryBond) -> Result<()> {
        let mut all = self.all()?;
        if all.iter().any(|b| b.bond.cusip == staged.bond.cusip) {
            return Err(BondtradeError::DuplicateAsset {
                key: format!("inventory/{}", staged.bond.cusip),
            });
        }
        tracing::debug!(org = %self.partition.org(), cusip = %staged.bond.cusip, "Bond staged");
        all.push(staged);
        self.save(&all)
    }

    /// Replace the staged bond with the same CUSIP as `spec`. Its metadata
    /// is kept.
    ///
    /// # Errors
    /// `InventoryBondNotFound` if nothing is staged under that CUSIP.
    pub fn edit(&self, spec: BondSpec) -> Result<()> {
        let mut all = self.all()?;
        let slot = all
            .iter_mut()
            .find(|b| b.bond.cusip == spec.cusip)
            .ok_or_else(|| BondtradeError::InventoryBondNotFound(spec.cusip.clone()))?;
        slot.bond = spec;
        self.save(&all)
    }

    /// # Errors
    /// `InventoryBondNotFound` if nothing is staged under `cusip`.
    pub fn remove(&self, cusip: &str) -> Result<InventoryBond> {
        let mut all = self.all()?;
        let pos = all
            .iter()
            .position(|b| b.bond.cusip == cusip)
            .ok_or_else(|| BondtradeError::InventoryBondNotFound(cusip.to_string()))?;
        let removed = all.remove(pos);
        if all.is_empty() {
            self.partition.delete(constants::INVENTORY_KEY)?;
        } else {
            self.save(&all)?;
        }
        tracing::debug!(org = %self.partition.org(), cusip, "Bond unstaged");
        Ok(removed)
    }

    fn save(&self, all: &[InventoryBond]) -> Result<()> {
        self.partition.put_json(constants::INVENTORY_KEY, &all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bondtrade_store::InMemoryPrivateStore;
    use bondtrade_types::{fixtures, AssetMetadata, CallerIdentity};
    use chrono::Utc;

    fn staged(caller: &CallerIdentity, cusip: &str, face: u64) -> InventoryBond {
        InventoryBond {
            metadata: AssetMetadata::stamp(caller, Utc::now()),
            bond: fixtures::bond_spec(cusip, face),
        }
    }

    #[test]
    fn add_edit_remove() {
        let store = InMemoryPrivateStore::new();
        let org = fixtures::caller("Org1MSP");
        let inv = PrivateInventory::new(PrivatePartition::for_caller(&store, &org));
        assert!(inv.all().unwrap().is_empty());

        let first = staged(&org, "US123", 1000);
        inv.add(first.clone()).unwrap();
        inv.add(staged(&org, "US456", 500)).unwrap();
        let err = inv.add(staged(&org, "US123", 2000)).unwrap_err();
        assert!(matches!(err, BondtradeError::DuplicateAsset { .. }));

        inv.edit(fixtures::bond_spec("US123", 3000)).unwrap();
        let edited = inv.get("US123").unwrap();
        assert_eq!(edited.bond.original_face, 3000);
        assert_eq!(edited.metadata, first.metadata);

        assert_eq!(inv.remove("US456").unwrap().bond.original_face, 500);
        let cusips: Vec<_> = inv.all().unwrap().into_iter().map(|b| b.bond.cusip).collect();
        assert_eq!(cusips, ["US123"]);
    }

    #[test]
    fn missing_cusip_is_not_found() {
        let store = InMemoryPrivateStore::new();
        let org = fixtures::caller("Org1MSP");
        let inv = PrivateInventory::new(PrivatePartition::for_caller(&store, &org));

        assert!(matches!(
            inv.get("US123"),
            Err(BondtradeError::InventoryBondNotFound(c)) if c == "US123"
        ));
        assert!(matches!(
            inv.edit(fixtures::bond_spec("US123", 1)),
            Err(BondtradeError::InventoryBondNotFound(_))
        ));
        assert!(matches!(
            inv.remove("US123"),
            Err(BondtradeError::InventoryBondNotFound(_))
        ));
    }

    #[test]
    fn inventories_are_per_org() {
        let store = InMemoryPrivateStore::new();
        let a = fixtures::caller("Org1MSP");
        let b = fixtures::caller("Org2MSP");
        PrivateInventory::new(PrivatePartition::for_caller(&store, &a))
            .add(staged(&a, "US123", 1000))
            .unwrap();

        let theirs = PrivateInventory::new(PrivatePartition::for_caller(&store, &b));
        assert!(theirs.all().unwrap().is_empty());
        // Same CUSIP staged independently by another org.
        theirs.add(staged(&b, "US123", 1000)).unwrap();
        assert_eq!(theirs.get("US123").unwrap().metadata.owner, b.org);
    }

    #[test]
    fn removing_last_bond_clears_the_key() {
        let store = InMemoryPrivateStore::new();
        let org = fixtures::caller("Org1MSP");
        let inv = PrivateInventory::new(PrivatePartition::for_caller(&store, &org));
        inv.add(staged(&org, "US123", 1000)).unwrap();
        inv.remove("US123").unwrap();
        let raw = PrivatePartition::for_caller(&store, &org)
            .get_raw(constants::INVENTORY_KEY)
            .unwrap();
        assert!(raw.is_none());
    }
}
