use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::order_event::event_status;
use crate::models::OrderEvent;

/// Insert a new audit row at 'attempted', before any network call is made.
#[allow(clippy::too_many_arguments)]
pub async fn insert_attempt(
    pool: &PgPool,
    user_id: Uuid,
    wallet: &str,
    condition_id: &str,
    token_id: Option<&str>,
    side: &str,
    price: Decimal,
    size: Decimal,
    details: serde_json::Value,
) -> anyhow::Result<OrderEvent> {
    let event = sqlx::query_as::<_, OrderEvent>(
        r#"
        INSERT INTO order_events
            (user_id, wallet, idempotency_key, condition_id, token_id, side, price, size, status, details)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(wallet)
    .bind(Uuid::new_v4())
    .bind(condition_id)
    .bind(token_id)
    .bind(side)
    .bind(price)
    .bind(size)
    .bind(event_status::ATTEMPTED)
    .bind(details)
    .fetch_one(pool)
    .await?;

    Ok(event)
}

/// Close the event out as submitted, recording the exchange order id.
pub async fn mark_submitted(
    pool: &PgPool,
    event_id: Uuid,
    exchange_order_id: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE order_events
        SET status = $2,
            message = $3,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(event_id)
    .bind(event_status::SUBMITTED)
    .bind(exchange_order_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Close the event out as rejected with a normalized error code.
pub async fn mark_rejected(
    pool: &PgPool,
    event_id: Uuid,
    error_code: &str,
    message: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE order_events
        SET status = $2,
            error_code = $3,
            message = $4,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(event_id)
    .bind(event_status::REJECTED)
    .bind(error_code)
    .bind(message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Merge extra detail (e.g. the fill ratio of a partial fill) into the audit
/// row without touching its status.
pub async fn merge_details(
    pool: &PgPool,
    event_id: Uuid,
    extra: serde_json::Value,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE order_events SET details = details || $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(event_id)
    .bind(extra)
    .execute(pool)
    .await?;

    Ok(())
}
