use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Market / Token (CLOB API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiToken {
    pub token_id: String,
    pub outcome: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub winner: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiMarket {
    pub condition_id: String,
    pub question: String,
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
    #[serde(default)]
    pub tick_size: Option<Decimal>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub closed: Option<bool>,
}

impl ApiMarket {
    /// Find the token for an outcome label, case-insensitively.
    pub fn token_for_outcome(&self, outcome: &str) -> Option<&ApiToken> {
        self.tokens
            .iter()
            .find(|t| t.outcome.eq_ignore_ascii_case(outcome))
    }

    /// The winning outcome label once the market has resolved.
    pub fn winning_outcome(&self) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| t.winner == Some(true))
            .map(|t| t.outcome.as_str())
    }

    /// Resolved means closed with a determined winner.
    pub fn is_resolved(&self) -> bool {
        self.closed == Some(true) && self.winning_outcome().is_some()
    }
}

// ---------------------------------------------------------------------------
// Positions (Data API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiPosition {
    /// Condition id of the market; the Data API spells it `conditionId`.
    #[serde(rename = "conditionId", default)]
    pub condition_id: Option<String>,
    /// Outcome token id (decimal string).
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub size: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Order submission / lookup (CLOB API)
// ---------------------------------------------------------------------------

/// Raw response from posting an order.
#[derive(Debug, Clone, Deserialize)]
pub struct PostOrderResponse {
    #[serde(rename = "orderID", default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "errorMsg", default)]
    pub error_msg: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Raw response from looking an order up by id.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLookupResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(alias = "size_matched", alias = "filledSize", default)]
    pub size_matched: Option<Decimal>,
    #[serde(alias = "original_size", alias = "originalSize", default)]
    pub original_size: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// Normalized result of an order submission. Every exchange response funnels
/// through exactly one of these variants.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Submitted { order_id: String, status: String },
    Rejected { error_code: String, message: String },
    GateUnavailable,
}

impl PostOrderResponse {
    /// Collapse the loosely-typed exchange response into a tagged outcome.
    /// FAK orders that cross nothing come back "unmatched".
    pub fn into_outcome(self) -> SubmitOutcome {
        let status = self.status.unwrap_or_default().to_lowercase();
        let accepted = matches!(status.as_str(), "matched" | "live" | "delayed");

        match (accepted, self.order_id) {
            (true, Some(order_id)) if !order_id.is_empty() => SubmitOutcome::Submitted {
                order_id,
                status,
            },
            _ => {
                let message = self
                    .error_msg
                    .or(self.error)
                    .unwrap_or_else(|| format!("order not accepted (status: {status})"));
                SubmitOutcome::Rejected {
                    error_code: crate::models::order_event::event_error::EXCHANGE_REJECTED.into(),
                    message,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_finds_outcome_token_case_insensitively() {
        let market: ApiMarket = serde_json::from_str(
            r#"{
                "condition_id": "0xabc",
                "question": "Will it rain?",
                "tick_size": "0.01",
                "closed": true,
                "tokens": [
                    {"token_id": "1", "outcome": "Yes", "price": "0.7", "winner": true},
                    {"token_id": "2", "outcome": "No", "price": "0.3", "winner": false}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(market.token_for_outcome("YES").unwrap().token_id, "1");
        assert_eq!(market.winning_outcome(), Some("Yes"));
        assert!(market.is_resolved());
    }

    #[test]
    fn closed_market_without_winner_is_not_resolved() {
        let market: ApiMarket = serde_json::from_str(
            r#"{
                "condition_id": "0xabc",
                "question": "q",
                "closed": true,
                "tokens": [{"token_id": "1", "outcome": "Yes"}]
            }"#,
        )
        .unwrap();

        assert!(!market.is_resolved());
    }

    #[test]
    fn matched_response_normalizes_to_submitted() {
        let resp: PostOrderResponse =
            serde_json::from_str(r#"{"orderID": "0xdeadbeef", "status": "matched"}"#).unwrap();

        match resp.into_outcome() {
            SubmitOutcome::Submitted { order_id, status } => {
                assert_eq!(order_id, "0xdeadbeef");
                assert_eq!(status, "matched");
            }
            other => panic!("expected Submitted, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_response_normalizes_to_rejected() {
        let resp: PostOrderResponse =
            serde_json::from_str(r#"{"orderID": "0x1", "status": "unmatched"}"#).unwrap();

        assert!(matches!(resp.into_outcome(), SubmitOutcome::Rejected { .. }));
    }

    #[test]
    fn error_message_is_carried_into_rejection() {
        let resp: PostOrderResponse =
            serde_json::from_str(r#"{"errorMsg": "not enough balance"}"#).unwrap();

        match resp.into_outcome() {
            SubmitOutcome::Rejected { message, .. } => {
                assert_eq!(message, "not enough balance");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }
}
