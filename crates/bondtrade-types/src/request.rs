//! Request payloads for the negotiation operations.
//!
//! Payloads arrive as JSON from the hosting platform. Decoding failures map
//! to [`BondtradeError::Encoding`]; well-formed payloads with bad values map
//! to [`BondtradeError::InvalidRequest`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BondtradeError, DirectTradeId, OwnerHash, ResponseValue, Result};

/// Open a new direct trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTradeRequest {
    pub cusip: String,
    pub original_face: u64,
    pub bid_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl CreateTradeRequest {
    pub fn from_json(payload: &str) -> Result<Self> {
        let req: Self = serde_json::from_str(payload)?;
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cusip.trim().is_empty() {
            return Err(invalid("cusip must not be empty"));
        }
        if self.original_face == 0 {
            return Err(invalid("original face must be positive"));
        }
        if self.bid_price <= Decimal::ZERO {
            return Err(invalid("bid price must be positive"));
        }
        Ok(())
    }
}

/// A seller's or buyer's response on one answer slot of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnswerRequest {
    pub trade_id: DirectTradeId,
    /// Which seller's answer slot this response belongs to.
    pub seller_identity_hash: OwnerHash,
    pub value: ResponseValue,
    pub timestamp: DateTime<Utc>,
}

impl AnswerRequest {
    pub fn from_json(payload: &str) -> Result<Self> {
        let req: Self = serde_json::from_str(payload)?;
        req.validate()?;
        Ok(req)
    }

    /// An empty response carries no position and is rejected.
    pub fn validate(&self) -> Result<()> {
        if self.value == ResponseValue::Empty {
            return Err(invalid("response value must be yes, no or counter"));
        }
        if self.seller_identity_hash.as_str().is_empty() {
            return Err(invalid("seller identity hash must not be empty"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> BondtradeError {
    BondtradeError::InvalidRequest {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_trade_decodes() {
        let req = CreateTradeRequest::from_json(
            r#"{"cusip":"US123","originalFace":1000,"bidPrice":"99.5","createdAt":"2024-01-09T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(req.bid_price, Decimal::new(995, 1));
        assert_eq!(req.created_at.timestamp(), 1_704_801_600);
    }

    #[test]
    fn create_trade_rejects_bad_values() {
        let err = CreateTradeRequest::from_json(
            r#"{"cusip":"US123","originalFace":1000,"bidPrice":"0","createdAt":"2024-01-09T12:00:00Z"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BondtradeError::InvalidRequest { .. }));

        let err = CreateTradeRequest::from_json(
            r#"{"cusip":"US123","originalFace":1000,"bidPrice":"99.5","createdAt":"yesterday"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BondtradeError::Encoding(_)));
    }

    #[test]
    fn answer_decodes_and_rejects_empty_value() {
        let trade_id = DirectTradeId::new();
        let json = format!(
            r#"{{"tradeId":"{}","sellerIdentityHash":"abc","value":"yes","timestamp":"2024-01-09T12:00:00Z"}}"#,
            trade_id.0
        );
        let req = AnswerRequest::from_json(&json).unwrap();
        assert_eq!(req.trade_id, trade_id);
        assert_eq!(req.value, ResponseValue::Yes);

        let empty = json.replace("\"yes\"", "\"\"");
        let err = AnswerRequest::from_json(&empty).unwrap_err();
        assert!(matches!(err, BondtradeError::InvalidRequest { .. }));

        let unknown = json.replace("\"yes\"", "\"maybe\"");
        let err = AnswerRequest::from_json(&unknown).unwrap_err();
        assert!(matches!(err, BondtradeError::Encoding(_)));
    }
}
