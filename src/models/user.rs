use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for users table. Only the fields the reconciliation job
/// needs; the full profile lives in the web app.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    /// The follower's proxy wallet whose positions are reconciled.
    pub wallet: String,
    pub notify_enabled: bool,
    pub created_at: DateTime<Utc>,
}
