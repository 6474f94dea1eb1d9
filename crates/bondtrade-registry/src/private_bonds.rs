//! The caller's list of private bond extensions.
//!
//! Stored as one JSON list under a single private partition key. Entries
//! reference public bonds by uid only; nothing keeps them in sync with the
//! ledger, so lookups treat a missing or dangling entry as "no private data".

use bondtrade_store::PrivatePartition;
use bondtrade_types::{constants, BondUid, PrivateBondExtension, Result};

/// Read/write view over one organization's private bond extensions.
pub struct PrivateBondBook<'a> {
    partition: PrivatePartition<'a>,
}

impl<'a> PrivateBondBook<'a> {
    #[must_use]
    pub fn new(partition: PrivatePartition<'a>) -> Self {
        Self { partition }
    }

    pub fn all(&self) -> Result<Vec<PrivateBondExtension>> {
        Ok(self
            .partition
            .get_json(constants::PRIVATE_BONDS_KEY)?
            .unwrap_or_default())
    }

    pub fn get(&self, uid: BondUid) -> Result<Option<PrivateBondExtension>> {
        Ok(self.all()?.into_iter().find(|e| e.uid == uid))
    }

    /// Insert or replace the extension for `ext.uid`.
    pub fn upsert(&self, ext: PrivateBondExtension) -> Result<()> {
        let mut all = self.all()?;
        match all.iter_mut().find(|e| e.uid == ext.uid) {
            Some(existing) => *existing = ext,
            None => all.push(ext),
        }
        self.save(&all)
    }

    /// Drop the extension for `uid`. Returns whether one existed.
    pub fn remove(&self, uid: BondUid) -> Result<bool> {
        let mut all = self.all()?;
        let before = all.len();
        all.retain(|e| e.uid != uid);
        if all.len() == before {
            return Ok(false);
        }
        self.save(&all)?;
        Ok(true)
    }

    fn save(&self, all: &[PrivateBondExtension]) -> Result<()> {
        self.partition.put_json(constants::PRIVATE_BONDS_KEY, &all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bondtrade_store::InMemoryPrivateStore;
    use bondtrade_types::fixtures;
    use rust_decimal::Decimal;

    #[test]
    fn upsert_get_remove() {
        let store = InMemoryPrivateStore::new();
        let org = fixtures::caller("Org1MSP");
        let book = PrivateBondBook::new(PrivatePartition::for_caller(&store, &org));
        let uid = BondUid::new();

        assert!(book.all().unwrap().is_empty());
        assert!(book.get(uid).unwrap().is_none());

        book.upsert(PrivateBondExtension {
            uid,
            reserve_price: Decimal::new(99, 0),
        })
        .unwrap();
        book.upsert(PrivateBondExtension {
            uid,
            reserve_price: Decimal::new(101, 0),
        })
        .unwrap();
        assert_eq!(book.all().unwrap().len(), 1);
        assert_eq!(book.get(uid).unwrap().unwrap().reserve_price, Decimal::new(101, 0));

        assert!(book.remove(uid).unwrap());
        assert!(!book.remove(uid).unwrap());
        assert!(book.get(uid).unwrap().is_none());
    }

    #[test]
    fn other_orgs_see_nothing() {
        let store = InMemoryPrivateStore::new();
        let a = fixtures::caller("Org1MSP");
        let b = fixtures::caller("Org2MSP");
        let uid = BondUid::new();
        PrivateBondBook::new(PrivatePartition::for_caller(&store, &a))
            .upsert(PrivateBondExtension {
                uid,
                reserve_price: Decimal::ONE,
            })
            .unwrap();

        let theirs = PrivateBondBook::new(PrivatePartition::for_caller(&store, &b));
        assert!(theirs.get(uid).unwrap().is_none());
    }
}
