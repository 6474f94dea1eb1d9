//! Engine configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{constants, BondtradeError, Clock, Result};

/// Where operation timestamps come from.
///
/// `Host` ignores caller-supplied times for anything stored on the ledger
/// (trade creation, answers, transactions), so settlement ordering follows
/// the host clock. `Caller` records the times exactly as supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    #[default]
    Host,
    Caller,
}

impl TimestampPolicy {
    /// The timestamp to record for an operation the caller stamped `supplied`.
    #[must_use]
    pub fn resolve(self, supplied: DateTime<Utc>, clock: &dyn Clock) -> DateTime<Utc> {
        match self {
            Self::Host => clock.now(),
            Self::Caller => supplied,
        }
    }
}

/// Configuration shared by the registry and the negotiation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Key of the ledger document in the shared store.
    pub ledger_key: String,
    /// How many times a conflicted operation is repeated before giving up.
    pub max_conflict_retries: u32,
    pub timestamp_policy: TimestampPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ledger_key: constants::DEFAULT_LEDGER_KEY.to_string(),
            max_conflict_retries: constants::DEFAULT_MAX_CONFLICT_RETRIES,
            timestamp_policy: TimestampPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config document. Missing fields take their defaults.
    ///
    /// # Errors
    /// `Configuration` if the document is malformed or invalid.
    pub fn from_json(doc: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(doc)
            .map_err(|e| BondtradeError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ledger_key.is_empty() {
            return Err(BondtradeError::Configuration(
                "ledger_key must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.ledger_key, "ledger");
        assert_eq!(cfg.max_conflict_retries, 3);
        assert_eq!(cfg.timestamp_policy, TimestampPolicy::Host);
    }

    #[test]
    fn policy_resolution() {
        let host_now = Utc::now();
        let clock = crate::FixedClock::new(host_now);
        let supplied = host_now - chrono::Duration::days(1);
        assert_eq!(TimestampPolicy::Host.resolve(supplied, &clock), host_now);
        assert_eq!(TimestampPolicy::Caller.resolve(supplied, &clock), supplied);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = EngineConfig::from_json(r#"{"timestamp_policy":"caller"}"#).unwrap();
        assert_eq!(cfg.timestamp_policy, TimestampPolicy::Caller);
        assert_eq!(cfg.ledger_key, "ledger");
    }

    #[test]
    fn rejects_empty_key_and_garbage() {
        let err = EngineConfig::from_json(r#"{"ledger_key":""}"#).unwrap_err();
        assert!(matches!(err, BondtradeError::Configuration(_)));
        let err = EngineConfig::from_json("[").unwrap_err();
        assert!(matches!(err, BondtradeError::Configuration(_)));
    }
}
