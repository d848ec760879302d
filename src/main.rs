use std::str::FromStr;
use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;

use polycopy::api::router::create_router;
use polycopy::config::AppConfig;
use polycopy::db;
use polycopy::polymarket::{
    ApiCredentials, ClobClient, DataClient, EgressGate, OrderSigner, SignatureType,
};
use polycopy::reconcile::JobContext;
use polycopy::services::mailer::Mailer;
use polycopy::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database connected");

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()?;

    // --- Polymarket clients ---
    let mut clob = ClobClient::new(http.clone()).with_base_url(config.clob_url.clone());
    if config.has_polymarket_auth() {
        let credentials = ApiCredentials::new(
            config.polymarket_api_key.clone().unwrap(),
            config.polymarket_api_secret.clone().unwrap(),
            config.polymarket_passphrase.clone().unwrap(),
        );
        let key = PrivateKeySigner::from_str(config.private_key.as_deref().unwrap())?;
        let signature_type = match config.signature_type {
            1 => SignatureType::Poly,
            2 => SignatureType::PolyProxy,
            _ => SignatureType::Eoa,
        };
        let signer = OrderSigner::new(key, signature_type);
        tracing::info!(address = %format!("{:?}", signer.address()), "Order signer configured");
        clob = clob.with_auth(credentials, signer);
    } else {
        tracing::warn!("No Polymarket credentials — close orders cannot be submitted");
    }

    let data = DataClient::new(http.clone()).with_base_url(config.data_api_url.clone());
    let gate = EgressGate::new(http.clone(), config.egress_proxy_url.clone());

    // --- Email ---
    let mailer = match Mailer::from_config(&config) {
        Ok(Some(m)) => Some(Arc::new(m)),
        Ok(None) => {
            tracing::warn!("SMTP not configured — notification emails disabled");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build mailer — notification emails disabled");
            None
        }
    };

    let metrics_handle = polycopy::metrics::init_metrics();

    let job = Arc::new(JobContext {
        db: db.clone(),
        clob,
        data,
        gate,
        mailer,
        candidate_limit: config.candidate_limit,
        default_slippage_pct: config.default_slippage_pct,
    });

    let state = AppState {
        db,
        config,
        metrics_handle,
        job,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
