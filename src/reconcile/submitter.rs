//! Builds, audits, and submits reduce-only close orders.
//!
//! Every attempt writes an order_events row at 'attempted' before any network
//! call and closes it out afterwards, so the audit trail never holds a row
//! stuck at 'attempted'.

use rust_decimal::Decimal;
use serde_json::json;

use crate::db::order_event_repo;
use crate::models::order_event::event_error;
use crate::models::{FollowedOrder, Side, UserAccount};
use crate::polymarket::SubmitOutcome;

use super::JobContext;

/// Result of one submission attempt, after the audit row is closed out.
#[derive(Debug, Clone)]
pub enum Submission {
    Submitted {
        event_id: uuid::Uuid,
        exchange_order_id: String,
    },
    Rejected {
        message: String,
    },
}

/// Submit a close order for `size` shares at `limit_price`.
///
/// The egress gate is checked after the audit row exists and before any
/// exchange call; a gate failure is recorded as a rejection with its own
/// error code and never reaches the exchange.
pub async fn submit_close_order(
    ctx: &JobContext,
    order: &FollowedOrder,
    user: &UserAccount,
    token_id: &str,
    close_side: Side,
    limit_price: Decimal,
    size: Decimal,
) -> anyhow::Result<Submission> {
    let details = json!({
        "followed_order_id": order.id,
        "retry_count": order.retry_count,
    });

    let event = order_event_repo::insert_attempt(
        &ctx.db,
        user.id,
        &user.wallet,
        &order.condition_id,
        Some(token_id),
        &close_side.to_string(),
        limit_price,
        size,
        details,
    )
    .await?;

    if let Err(e) = ctx.gate.check().await {
        tracing::warn!(
            order_id = %order.id,
            error = %e,
            "Egress gate unavailable — refusing to submit"
        );
        order_event_repo::mark_rejected(
            &ctx.db,
            event.id,
            event_error::PROXY_UNAVAILABLE,
            &e.to_string(),
        )
        .await?;
        return Ok(Submission::Rejected {
            message: format!("egress gate unavailable: {e}"),
        });
    }

    let outcome = match ctx
        .clob
        .submit_fak_order(token_id, close_side, limit_price, size)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            // Transport/signing failure: close the audit row out before
            // surfacing the failure to the retry tracker.
            order_event_repo::mark_rejected(
                &ctx.db,
                event.id,
                event_error::EXCHANGE_REJECTED,
                &e.to_string(),
            )
            .await?;
            return Ok(Submission::Rejected {
                message: e.to_string(),
            });
        }
    };

    match outcome {
        SubmitOutcome::Submitted {
            order_id: exchange_order_id,
            status,
        } => {
            tracing::info!(
                order_id = %order.id,
                exchange_order_id = %exchange_order_id,
                status = %status,
                side = %close_side,
                size = %size,
                price = %limit_price,
                "Close order submitted"
            );
            order_event_repo::mark_submitted(&ctx.db, event.id, &exchange_order_id).await?;
            Ok(Submission::Submitted {
                event_id: event.id,
                exchange_order_id,
            })
        }
        SubmitOutcome::Rejected {
            error_code,
            message,
        } => {
            tracing::warn!(
                order_id = %order.id,
                error_code = %error_code,
                message = %message,
                "Close order rejected by exchange"
            );
            order_event_repo::mark_rejected(&ctx.db, event.id, &error_code, &message).await?;
            Ok(Submission::Rejected { message })
        }
        SubmitOutcome::GateUnavailable => {
            order_event_repo::mark_rejected(
                &ctx.db,
                event.id,
                event_error::PROXY_UNAVAILABLE,
                "egress gate unavailable",
            )
            .await?;
            Ok(Submission::Rejected {
                message: "egress gate unavailable".into(),
            })
        }
    }
}
