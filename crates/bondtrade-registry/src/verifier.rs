//! Pseudo-identity derivation and ownership checks.
//!
//! Ledger records never name an organization. They carry an [`OwnerHash`]
//! derived from a secret the organization keeps in its private partition,
//! its identity token, and (for per-trade pseudonyms) a timestamp:
//!
//! ```text
//! SHA-256("bondtrade:owner:v1:" || len(secret) || secret
//!         || len(token) || token || 0x00)                         base hash
//! SHA-256(... || 0x01 || unix_secs || subsec_nanos)               pseudonym
//! ```
//!
//! Ownership is proven by re-deriving the hash and comparing for equality.
//! This is a local secret-possession check, not a verifiable signature.

use std::collections::HashMap;
use std::sync::Arc;

use bondtrade_store::{PrivatePartition, PrivateStore};
use bondtrade_types::{
    constants, BondtradeError, CallerIdentity, DirectTrade, DirectTradeId, OwnerHash, Result,
    TradeLedger,
};
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Derive an owner hash from its raw inputs.
///
/// Same inputs always give the same hash; any change to `at` gives an
/// unrelated one.
#[must_use]
pub fn derive_hash(secret: &str, identity_token: &str, at: Option<DateTime<Utc>>) -> OwnerHash {
    let mut hasher = Sha256::new();
    hasher.update(constants::OWNER_HASH_DOMAIN);
    hasher.update((secret.len() as u64).to_le_bytes());
    hasher.update(secret.as_bytes());
    hasher.update((identity_token.len() as u64).to_le_bytes());
    hasher.update(identity_token.as_bytes());
    match at {
        None => hasher.update([0u8]),
        Some(ts) => {
            hasher.update([1u8]);
            hasher.update(ts.timestamp().to_le_bytes());
            hasher.update(ts.timestamp_subsec_nanos().to_le_bytes());
        }
    }
    OwnerHash::from_digest(&hasher.finalize())
}

/// Derives and checks pseudo-identities using each caller's stored secret.
#[derive(Clone)]
pub struct OwnershipVerifier {
    private: Arc<dyn PrivateStore>,
}

impl OwnershipVerifier {
    #[must_use]
    pub fn new(private: Arc<dyn PrivateStore>) -> Self {
        Self { private }
    }

    /// Store the caller's secret, generating a random one if none is given.
    ///
    /// Replacing the secret changes every hash the caller derives from then
    /// on; bonds recorded under the old hash are no longer recognised.
    pub fn set_secret(&self, caller: &CallerIdentity, secret: Option<String>) -> Result<()> {
        let secret = match secret {
            Some(s) if s.is_empty() => {
                return Err(BondtradeError::InvalidRequest {
                    reason: "secret must not be empty".into(),
                });
            }
            Some(s) => s,
            None => {
                let mut bytes = [0u8; constants::GENERATED_SECRET_BYTES];
                rand::thread_rng().fill_bytes(&mut bytes);
                hex::encode(bytes)
            }
        };
        PrivatePartition::for_caller(self.private.as_ref(), caller)
            .put_raw(constants::SECRET_KEY, secret)?;
        tracing::info!(org = %caller.org, "Owner secret set");
        Ok(())
    }

    fn secret(&self, caller: &CallerIdentity) -> Result<String> {
        PrivatePartition::for_caller(self.private.as_ref(), caller)
            .get_raw(constants::SECRET_KEY)?
            .ok_or_else(|| BondtradeError::SecretNotFound(caller.org.clone()))
    }

    /// The caller's owner hash, optionally bound to a negotiation timestamp.
    ///
    /// # Errors
    /// [`BondtradeError::SecretNotFound`] if the caller never set a secret.
    pub fn derive_owner_hash(
        &self,
        caller: &CallerIdentity,
        at: Option<DateTime<Utc>>,
    ) -> Result<OwnerHash> {
        let secret = self.secret(caller)?;
        Ok(derive_hash(&secret, &caller.identity_token, at))
    }

    /// `candidate` equals the caller's base hash (no timestamp component).
    ///
    /// A caller without a secret owns nothing.
    pub fn is_owner(&self, candidate: &OwnerHash, caller: &CallerIdentity) -> bool {
        self.derive_owner_hash(caller, None)
            .is_ok_and(|own| &own == candidate)
    }

    /// Every hash the caller can prove against `ledger`: the base hash plus
    /// the caller's pseudonym for each trade on the ledger.
    pub fn known_hashes(&self, ledger: &TradeLedger, caller: &CallerIdentity) -> Result<KnownHashes> {
        let secret = self.secret(caller)?;
        let base = derive_hash(&secret, &caller.identity_token, None);
        let pseudonyms = ledger
            .trades
            .iter()
            .map(|t| {
                (
                    t.id,
                    derive_hash(&secret, &caller.identity_token, Some(t.created_at)),
                )
            })
            .collect();
        Ok(KnownHashes { base, pseudonyms })
    }
}

/// The caller's base hash and per-trade pseudonyms for one ledger snapshot.
#[derive(Debug, Clone)]
pub struct KnownHashes {
    base: OwnerHash,
    pseudonyms: HashMap<DirectTradeId, OwnerHash>,
}

impl KnownHashes {
    #[must_use]
    pub fn base(&self) -> &OwnerHash {
        &self.base
    }

    /// The caller initiated `trade`.
    #[must_use]
    pub fn is_bidder(&self, trade: &DirectTrade) -> bool {
        self.pseudonyms.get(&trade.id) == Some(&trade.bidder_hash)
    }

    /// `hash` is the caller's base hash or the pseudonym of a trade the
    /// caller initiated (how bought bonds are recorded).
    #[must_use]
    pub fn holds(&self, hash: &OwnerHash) -> bool {
        &self.base == hash || self.pseudonyms.values().any(|p| p == hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bondtrade_store::InMemoryPrivateStore;
    use bondtrade_types::fixtures;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn verifier() -> OwnershipVerifier {
        OwnershipVerifier::new(Arc::new(InMemoryPrivateStore::new()))
    }

    #[test]
    fn derivation_is_idempotent_and_timestamp_bound() {
        let v = verifier();
        let org = fixtures::caller("Org1MSP");
        v.set_secret(&org, Some("s3cret".into())).unwrap();

        let t = Utc::now();
        let a = v.derive_owner_hash(&org, Some(t)).unwrap();
        let b = v.derive_owner_hash(&org, Some(t)).unwrap();
        assert_eq!(a, b);

        let c = v.derive_owner_hash(&org, Some(t + Duration::nanoseconds(1))).unwrap();
        assert_ne!(a, c);

        let base = v.derive_owner_hash(&org, None).unwrap();
        assert_ne!(base, a);
        assert_eq!(base.as_str().len(), 64);
    }

    #[test]
    fn hash_depends_on_secret_and_token() {
        let base = derive_hash("s", "token", None);
        assert_ne!(base, derive_hash("s2", "token", None));
        assert_ne!(base, derive_hash("s", "token2", None));
        // Length prefixes keep the field boundary unambiguous.
        assert_ne!(derive_hash("ab", "c", None), derive_hash("a", "bc", None));
    }

    #[test]
    fn is_owner_uses_base_hash() {
        let v = verifier();
        let org1 = fixtures::caller("Org1MSP");
        let org2 = fixtures::caller("Org2MSP");
        v.set_secret(&org1, None).unwrap();
        v.set_secret(&org2, None).unwrap();

        let h1 = v.derive_owner_hash(&org1, None).unwrap();
        assert!(v.is_owner(&h1, &org1));
        assert!(!v.is_owner(&h1, &org2));

        let pseudonym = v.derive_owner_hash(&org1, Some(Utc::now())).unwrap();
        assert!(!v.is_owner(&pseudonym, &org1));
    }

    #[test]
    fn missing_secret() {
        let v = verifier();
        let org = fixtures::caller("Org9MSP");
        let err = v.derive_owner_hash(&org, None).unwrap_err();
        assert!(matches!(err, BondtradeError::SecretNotFound(_)));
        assert!(!v.is_owner(&OwnerHash::new("x"), &org));
    }

    #[test]
    fn empty_secret_rejected() {
        let v = verifier();
        let err = v
            .set_secret(&fixtures::caller("Org1MSP"), Some(String::new()))
            .unwrap_err();
        assert!(matches!(err, BondtradeError::InvalidRequest { .. }));
    }

    #[test]
    fn generated_secrets_differ() {
        let v = verifier();
        let a = fixtures::caller("Org1MSP");
        let b = CallerIdentity::new("Org2MSP", a.identity_token.clone());
        v.set_secret(&a, None).unwrap();
        v.set_secret(&b, None).unwrap();
        assert_ne!(
            v.derive_owner_hash(&a, None).unwrap(),
            v.derive_owner_hash(&b, None).unwrap()
        );
    }

    #[test]
    fn known_hashes_recognise_own_trades() {
        let v = verifier();
        let buyer = fixtures::caller("Org2MSP");
        let other = fixtures::caller("Org3MSP");
        v.set_secret(&buyer, None).unwrap();
        v.set_secret(&other, None).unwrap();

        let created_at = Utc::now();
        let bidder_hash = v.derive_owner_hash(&buyer, Some(created_at)).unwrap();
        let trade = DirectTrade::open("US123", 1000, Decimal::new(995, 1), bidder_hash.clone(), created_at);
        let mut ledger = TradeLedger::new();
        ledger.trades.push(trade.clone());

        let mine = v.known_hashes(&ledger, &buyer).unwrap();
        assert!(mine.is_bidder(&trade));
        assert!(mine.holds(&bidder_hash));
        assert!(mine.holds(mine.base()));

        let theirs = v.known_hashes(&ledger, &other).unwrap();
        assert!(!theirs.is_bidder(&trade));
        assert!(!theirs.holds(&bidder_hash));
    }
}
