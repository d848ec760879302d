pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod polymarket;
pub mod reconcile;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::reconcile::JobContext;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    /// Service handles the reconciliation job runs against.
    pub job: Arc<JobContext>,
}
