pub mod notifications;
pub mod pricing;
pub mod reduction;
pub mod retry;
pub mod runner;
pub mod submitter;
pub mod verifier;

use std::sync::Arc;

use sqlx::PgPool;

use crate::polymarket::{ClobClient, DataClient, EgressGate};
use crate::services::mailer::Mailer;

/// Service handles the reconciliation job runs against. Constructed once at
/// process start and passed by reference into every pass.
#[derive(Clone)]
pub struct JobContext {
    pub db: PgPool,
    pub clob: ClobClient,
    pub data: DataClient,
    pub gate: EgressGate,
    pub mailer: Option<Arc<Mailer>>,
    /// Cap on rows loaded per pass for each phase.
    pub candidate_limit: i64,
    /// Fallback slippage tolerance when an order carries none.
    pub default_slippage_pct: rust_decimal::Decimal,
}
