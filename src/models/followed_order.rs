use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for followed_orders table — a follower's record of having
/// copied a specific trade, plus the auto-close bookkeeping the
/// reconciliation job maintains.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FollowedOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trader_wallet: String,
    pub condition_id: String,
    pub token_id: Option<String>,
    pub outcome: String,
    pub side: String,
    pub status: String,
    pub remaining_size: Decimal,
    /// Last known size of the copied trader's position in this market/outcome.
    /// None until the first reconciliation pass observes it.
    pub trader_position_size: Option<Decimal>,

    pub auto_close_enabled: bool,
    pub slippage_pct: Decimal,
    /// Set once the position is fully closed. Terminal: the job never touches
    /// the order again.
    pub auto_close_triggered_at: Option<DateTime<Utc>>,
    pub auto_close_attempted_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub last_error: Option<String>,
    /// Exchange order id of the most recent close attempt.
    pub auto_close_order_id: Option<String>,
    /// Exchange order id submitted but not yet verified for fill. Cleared once
    /// verification reaches a definite outcome.
    pub pending_close_order_id: Option<String>,

    pub resolution_email_sent: bool,
    pub trader_close_email_sent: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order status constants.
pub mod order_status {
    pub const OPEN: &str = "open";
    pub const REDUCING: &str = "reducing";
    pub const CLOSED: &str = "closed";

    /// Statuses eligible for reconciliation.
    pub const OPEN_SET: &[&str] = &[OPEN, REDUCING];
}
