use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for order_events table — one audit row per exchange
/// interaction attempted by the job. Inserted at 'attempted' before any
/// network call, then updated in place to its terminal status.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub wallet: String,
    pub idempotency_key: Uuid,
    pub condition_id: String,
    pub token_id: Option<String>,
    pub side: String,
    pub price: Option<Decimal>,
    pub size: Option<Decimal>,
    pub status: String,
    pub error_code: Option<String>,
    pub message: Option<String>,
    /// Linkage back to the originating followed order, retry count at the
    /// time of the attempt, and the fill ratio for partial fills.
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event status constants.
pub mod event_status {
    pub const ATTEMPTED: &str = "attempted";
    pub const SUBMITTED: &str = "submitted";
    pub const REJECTED: &str = "rejected";
}

/// Error codes recorded on rejected events.
pub mod event_error {
    pub const PROXY_UNAVAILABLE: &str = "PROXY_UNAVAILABLE";
    pub const EXCHANGE_REJECTED: &str = "EXCHANGE_REJECTED";
}
