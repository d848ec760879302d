use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::followed_order::order_status;
use crate::models::FollowedOrder;

fn open_statuses() -> Vec<String> {
    order_status::OPEN_SET.iter().map(|s| s.to_string()).collect()
}

/// Orders eligible for an auto-close reconciliation pass: auto-close enabled,
/// not yet triggered, still open, with size left to close.
pub async fn get_auto_close_candidates(
    pool: &PgPool,
    limit: i64,
) -> anyhow::Result<Vec<FollowedOrder>> {
    let orders = sqlx::query_as::<_, FollowedOrder>(
        r#"
        SELECT * FROM followed_orders
        WHERE auto_close_enabled
          AND auto_close_triggered_at IS NULL
          AND status = ANY($1)
          AND remaining_size > 0
        ORDER BY created_at ASC
        LIMIT $2
        "#,
    )
    .bind(open_statuses())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

/// Orders with at least one lifecycle email still unsent.
pub async fn get_notification_candidates(
    pool: &PgPool,
    limit: i64,
) -> anyhow::Result<Vec<FollowedOrder>> {
    let orders = sqlx::query_as::<_, FollowedOrder>(
        r#"
        SELECT * FROM followed_orders
        WHERE status = ANY($1)
          AND (resolution_email_sent = FALSE OR trader_close_email_sent = FALSE)
        ORDER BY created_at ASC
        LIMIT $2
        "#,
    )
    .bind(open_statuses())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

/// Claim an order for an attempt by advancing `auto_close_attempted_at`,
/// conditional on it still holding the value this pass read. Returns None if
/// an overlapping invocation claimed the order first.
pub async fn claim_attempt(
    pool: &PgPool,
    order_id: Uuid,
    expected_attempted_at: Option<DateTime<Utc>>,
) -> anyhow::Result<Option<FollowedOrder>> {
    let claimed = sqlx::query_as::<_, FollowedOrder>(
        r#"
        UPDATE followed_orders
        SET auto_close_attempted_at = NOW(), updated_at = NOW()
        WHERE id = $1
          AND auto_close_attempted_at IS NOT DISTINCT FROM $2
        RETURNING *
        "#,
    )
    .bind(order_id)
    .bind(expected_attempted_at)
    .fetch_optional(pool)
    .await?;

    Ok(claimed)
}

/// Persist a freshly observed trader position size as the new baseline.
pub async fn update_trader_baseline(
    pool: &PgPool,
    order_id: Uuid,
    size: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE followed_orders SET trader_position_size = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(order_id)
    .bind(size)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record the exchange order id of a just-submitted close attempt. The order
/// stays pending until the fill verifier reaches a definite outcome.
pub async fn record_submission(
    pool: &PgPool,
    order_id: Uuid,
    exchange_order_id: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE followed_orders
        SET auto_close_order_id = $2, pending_close_order_id = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(exchange_order_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// A close attempt filled and the trader still holds part of their position:
/// shrink the remaining size, move the baseline, clear failure bookkeeping.
pub async fn record_partial_close(
    pool: &PgPool,
    order_id: Uuid,
    remaining_size: Decimal,
    trader_size: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE followed_orders
        SET remaining_size = $2,
            trader_position_size = $3,
            status = $4,
            retry_count = 0,
            last_error = NULL,
            pending_close_order_id = NULL,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(remaining_size)
    .bind(trader_size)
    .bind(order_status::REDUCING)
    .execute(pool)
    .await?;

    Ok(())
}

/// The position is fully closed: set the terminal marker and clear all
/// retry/pending state in the same statement.
pub async fn finalize_close(
    pool: &PgPool,
    order_id: Uuid,
    remaining_size: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE followed_orders
        SET auto_close_triggered_at = NOW(),
            status = $3,
            remaining_size = $2,
            trader_position_size = 0,
            retry_count = 0,
            last_error = NULL,
            pending_close_order_id = NULL,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(remaining_size)
    .bind(order_status::CLOSED)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a failed attempt: bump the retry counter and rewrite the error in
/// one statement so cooldown inputs never diverge.
pub async fn record_failure(
    pool: &PgPool,
    order_id: Uuid,
    retry_count: i32,
    message: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE followed_orders
        SET retry_count = $2,
            last_error = $3,
            pending_close_order_id = NULL,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(retry_count)
    .bind(message)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn mark_resolution_email_sent(pool: &PgPool, order_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE followed_orders SET resolution_email_sent = TRUE, updated_at = NOW() WHERE id = $1",
    )
    .bind(order_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn mark_trader_close_email_sent(pool: &PgPool, order_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE followed_orders SET trader_close_email_sent = TRUE, updated_at = NOW() WHERE id = $1",
    )
    .bind(order_id)
    .execute(pool)
    .await?;

    Ok(())
}
