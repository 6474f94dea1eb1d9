//! Per-organization private data partitions.
//!
//! Each organization gets its own key space that no other organization can
//! read. Access always goes through a [`PrivatePartition`] handle bound to
//! the caller's own [`OrgId`], so there is no API to name someone else's
//! partition.

use std::collections::HashMap;
use std::sync::Mutex;

use bondtrade_types::{BondtradeError, CallerIdentity, OrgId, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Raw partitioned key-value storage.
///
/// Backend failures surface as [`BondtradeError::Store`] from every method.
/// A failed `put` or `delete` leaves the key as it was.
pub trait PrivateStore: Send + Sync {
    fn get(&self, org: &OrgId, key: &str) -> Result<Option<String>>;
    fn put(&self, org: &OrgId, key: &str, value: String) -> Result<()>;
    /// Removing an absent key is not an error.
    fn delete(&self, org: &OrgId, key: &str) -> Result<()>;
}

/// Single-process [`PrivateStore`].
#[derive(Debug, Default)]
pub struct InMemoryPrivateStore {
    partitions: Mutex<HashMap<OrgId, HashMap<String, String>>>,
}

impl InMemoryPrivateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<OrgId, HashMap<String, String>>>> {
        self.partitions
            .lock()
            .map_err(|_| BondtradeError::Internal("private store mutex poisoned".into()))
    }
}

impl PrivateStore for InMemoryPrivateStore {
    fn get(&self, org: &OrgId, key: &str) -> Result<Option<String>> {
        Ok(self
            .lock()?
            .get(org)
            .and_then(|p| p.get(key))
            .cloned())
    }

    fn put(&self, org: &OrgId, key: &str, value: String) -> Result<()> {
        self.lock()?
            .entry(org.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, org: &OrgId, key: &str) -> Result<()> {
        if let Some(partition) = self.lock()?.get_mut(org) {
            partition.remove(key);
        }
        Ok(())
    }
}

/// The caller's own private partition.
pub struct PrivatePartition<'a> {
    store: &'a dyn PrivateStore,
    org: &'a OrgId,
}

impl<'a> PrivatePartition<'a> {
    #[must_use]
    pub fn for_caller(store: &'a dyn PrivateStore, caller: &'a CallerIdentity) -> Self {
        Self {
            store,
            org: &caller.org,
        }
    }

    #[must_use]
    pub fn org(&self) -> &OrgId {
        self.org
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.store.get(self.org, key)
    }

    pub fn put_raw(&self, key: &str, value: String) -> Result<()> {
        self.store.put(self.org, key, value)
    }

    /// Decode the JSON value under `key`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get_raw(key)?
            .map(|raw| serde_json::from_str(&raw).map_err(BondtradeError::from))
            .transpose()
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.put_raw(key, serde_json::to_string(value)?)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(self.org, key)
    }
}
