mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use polycopy::api::router::create_router;
use polycopy::config::AppConfig;
use polycopy::polymarket::{ClobClient, DataClient, EgressGate};
use polycopy::reconcile::JobContext;
use polycopy::AppState;

const TEST_CRON_SECRET: &str = "test-cron-secret";

async fn build_test_app() -> axum::Router {
    let pool = common::setup_test_db().await;
    let metrics_handle = common::test_metrics_handle();

    let config = AppConfig {
        database_url: "unused-in-tests".into(),
        host: "127.0.0.1".into(),
        port: 0,
        cron_secret: TEST_CRON_SECRET.into(),
        polymarket_api_key: None,
        polymarket_api_secret: None,
        polymarket_passphrase: None,
        private_key: None,
        clob_url: "https://clob.polymarket.com".into(),
        data_api_url: "https://data-api.polymarket.com".into(),
        egress_proxy_url: None,
        signature_type: 0,
        default_slippage_pct: rust_decimal::Decimal::TWO,
        candidate_limit: 500,
        smtp_host: None,
        smtp_port: 587,
        smtp_username: None,
        smtp_password: None,
        smtp_from: None,
    };

    let http = reqwest::Client::new();
    let job = Arc::new(JobContext {
        db: pool.clone(),
        clob: ClobClient::new(http.clone()),
        data: DataClient::new(http.clone()),
        gate: EgressGate::new(http, None),
        mailer: None,
        candidate_limit: config.candidate_limit,
        default_slippage_pct: config.default_slippage_pct,
    });

    let state = AppState {
        db: pool,
        config,
        metrics_handle,
        job,
    };

    create_router(state)
}

#[tokio::test]
async fn test_health() {
    let app = build_test_app().await;

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_cron_requires_bearer_token() {
    let app = build_test_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/cron/reconcile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cron_rejects_wrong_token() {
    let app = build_test_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/cron/reconcile")
                .header("authorization", "Bearer not-the-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cron_runs_empty_pass() {
    // With no candidate rows, both phases complete without touching any
    // external API.
    let app = build_test_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/cron/reconcile")
                .header("authorization", format!("Bearer {TEST_CRON_SECRET}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["tradesChecked"], 0);
    assert_eq!(json["notificationsSent"], 0);
}
