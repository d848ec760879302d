use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::errors::AppError;
use crate::reconcile::runner;
use crate::AppState;

/// GET /api/cron/reconcile — one scheduled reconciliation invocation.
pub async fn reconcile(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("Reconciliation run triggered");

    let outcome = runner::run(&state.job).await;

    tracing::info!(
        trades_checked = outcome.trades_checked,
        notifications_sent = outcome.notifications_sent,
        phase_errors = outcome.phase_errors.len(),
        "Reconciliation run finished"
    );

    if !outcome.phase_errors.is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!(
            outcome.phase_errors.join("; ")
        )));
    }

    Ok(Json(json!({
        "tradesChecked": outcome.trades_checked,
        "notificationsSent": outcome.notifications_sent,
    })))
}
