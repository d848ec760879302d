mod common;

use rust_decimal::Decimal;

use polycopy::db::followed_order_repo;

#[tokio::test]
async fn test_candidates_exclude_triggered_orders() {
    let _guard = common::db_lock().await;
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "terminal@example.com", "0xFOLLOWER_T").await;

    let active =
        common::seed_followed_order(&pool, user.id, "0xTRADER_A", "0xMARKET_A", Decimal::from(40))
            .await;
    let done =
        common::seed_followed_order(&pool, user.id, "0xTRADER_B", "0xMARKET_B", Decimal::from(40))
            .await;

    // Once triggered, an order is terminal and never re-attempted.
    followed_order_repo::finalize_close(&pool, done.id, Decimal::ZERO)
        .await
        .expect("finalize should succeed");

    let candidates = followed_order_repo::get_auto_close_candidates(&pool, 500)
        .await
        .expect("candidate query should succeed");

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, active.id);
}

#[tokio::test]
async fn test_candidates_exclude_disabled_and_empty_orders() {
    let _guard = common::db_lock().await;
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "filter@example.com", "0xFOLLOWER_F").await;

    let eligible =
        common::seed_followed_order(&pool, user.id, "0xTRADER_C", "0xMARKET_C", Decimal::from(10))
            .await;

    // Auto-close disabled
    let disabled =
        common::seed_followed_order(&pool, user.id, "0xTRADER_D", "0xMARKET_D", Decimal::from(10))
            .await;
    sqlx::query("UPDATE followed_orders SET auto_close_enabled = FALSE WHERE id = $1")
        .bind(disabled.id)
        .execute(&pool)
        .await
        .unwrap();

    // Nothing left to close
    let empty =
        common::seed_followed_order(&pool, user.id, "0xTRADER_E", "0xMARKET_E", Decimal::ZERO)
            .await;
    assert_eq!(empty.remaining_size, Decimal::ZERO);

    let candidates = followed_order_repo::get_auto_close_candidates(&pool, 500)
        .await
        .expect("candidate query should succeed");

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, eligible.id);
}

#[tokio::test]
async fn test_claim_attempt_is_a_compare_and_swap() {
    let _guard = common::db_lock().await;
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "cas@example.com", "0xFOLLOWER_CAS").await;
    let order =
        common::seed_followed_order(&pool, user.id, "0xTRADER_F", "0xMARKET_F", Decimal::from(25))
            .await;

    // First claim against the stored value succeeds.
    let claimed = followed_order_repo::claim_attempt(&pool, order.id, order.auto_close_attempted_at)
        .await
        .expect("claim should succeed");
    let claimed = claimed.expect("first claim should win");
    assert!(claimed.auto_close_attempted_at.is_some());

    // A second claim carrying the stale expectation loses.
    let stale = followed_order_repo::claim_attempt(&pool, order.id, order.auto_close_attempted_at)
        .await
        .expect("claim should succeed");
    assert!(stale.is_none(), "overlapping invocation must not double-claim");

    // Claiming with the fresh value works again.
    let reclaimed =
        followed_order_repo::claim_attempt(&pool, order.id, claimed.auto_close_attempted_at)
            .await
            .expect("claim should succeed");
    assert!(reclaimed.is_some());
}

#[tokio::test]
async fn test_failure_bookkeeping_and_terminal_clear() {
    let _guard = common::db_lock().await;
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "retry@example.com", "0xFOLLOWER_R").await;
    let order =
        common::seed_followed_order(&pool, user.id, "0xTRADER_G", "0xMARKET_G", Decimal::from(40))
            .await;

    followed_order_repo::record_failure(&pool, order.id, 1, "close order did not fill")
        .await
        .expect("record_failure should succeed");
    followed_order_repo::record_failure(&pool, order.id, 2, "egress gate unavailable")
        .await
        .expect("record_failure should succeed");

    let row: (i32, Option<String>) =
        sqlx::query_as("SELECT retry_count, last_error FROM followed_orders WHERE id = $1")
            .bind(order.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(row.0, 2);
    assert_eq!(row.1.as_deref(), Some("egress gate unavailable"));

    // Success clears the retry state entirely.
    followed_order_repo::finalize_close(&pool, order.id, Decimal::ZERO)
        .await
        .expect("finalize should succeed");

    let row: (i32, Option<String>, Option<chrono::DateTime<chrono::Utc>>) = sqlx::query_as(
        "SELECT retry_count, last_error, auto_close_triggered_at FROM followed_orders WHERE id = $1",
    )
    .bind(order.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row.0, 0);
    assert!(row.1.is_none());
    assert!(row.2.is_some());
}

#[tokio::test]
async fn test_partial_close_moves_baseline_and_size() {
    let _guard = common::db_lock().await;
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "partial@example.com", "0xFOLLOWER_P").await;
    let order =
        common::seed_followed_order(&pool, user.id, "0xTRADER_H", "0xMARKET_H", Decimal::from(50))
            .await;

    followed_order_repo::record_partial_close(&pool, order.id, Decimal::from(30), Decimal::from(60))
        .await
        .expect("record_partial_close should succeed");

    let row: (Decimal, Option<Decimal>, String) = sqlx::query_as(
        "SELECT remaining_size, trader_position_size, status FROM followed_orders WHERE id = $1",
    )
    .bind(order.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(row.0, Decimal::from(30));
    assert_eq!(row.1, Some(Decimal::from(60)));
    assert_eq!(row.2, "reducing");

    // Still a candidate: the trader may reduce again.
    let candidates = followed_order_repo::get_auto_close_candidates(&pool, 500)
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
}

#[tokio::test]
async fn test_notification_candidates_exclude_fully_notified() {
    let _guard = common::db_lock().await;
    let pool = common::setup_test_db().await;
    let user = common::seed_user(&pool, "notify@example.com", "0xFOLLOWER_N").await;

    let open =
        common::seed_followed_order(&pool, user.id, "0xTRADER_I", "0xMARKET_I", Decimal::from(10))
            .await;

    let done =
        common::seed_followed_order(&pool, user.id, "0xTRADER_J", "0xMARKET_J", Decimal::from(10))
            .await;
    followed_order_repo::mark_resolution_email_sent(&pool, done.id)
        .await
        .unwrap();
    followed_order_repo::mark_trader_close_email_sent(&pool, done.id)
        .await
        .unwrap();

    let candidates = followed_order_repo::get_notification_candidates(&pool, 500)
        .await
        .expect("candidate query should succeed");

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, open.id);
}
