use rust_decimal::Decimal;
use std::env;

const DEFAULT_CLOB_URL: &str = "https://clob.polymarket.com";
const DEFAULT_DATA_API_URL: &str = "https://data-api.polymarket.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    /// Shared secret the external scheduler must present as a bearer token.
    pub cron_secret: String,

    // Polymarket API credentials (optional — reconciliation runs in dry-run
    // mode without them)
    pub polymarket_api_key: Option<String>,
    pub polymarket_api_secret: Option<String>,
    pub polymarket_passphrase: Option<String>,
    /// Hex-encoded private key for EIP-712 order signing.
    pub private_key: Option<String>,

    pub clob_url: String,
    pub data_api_url: String,
    /// Static-egress proxy the exchange submission rides through. Submission
    /// is refused when its healthcheck fails.
    pub egress_proxy_url: Option<String>,
    /// Signature type carried on signed orders (0 EOA, 1 contract, 2 proxy).
    pub signature_type: u8,

    // Auto-close behaviour
    pub default_slippage_pct: Decimal,
    pub candidate_limit: i64,

    // SMTP (optional — notifications are skipped without it)
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            cron_secret: env::var("CRON_SECRET")
                .map_err(|_| anyhow::anyhow!("CRON_SECRET must be set"))?,

            polymarket_api_key: env::var("POLYMARKET_API_KEY").ok(),
            polymarket_api_secret: env::var("POLYMARKET_API_SECRET").ok(),
            polymarket_passphrase: env::var("POLYMARKET_PASSPHRASE").ok(),
            private_key: env::var("POLYMARKET_PRIVATE_KEY").ok(),

            clob_url: env::var("CLOB_URL").unwrap_or_else(|_| DEFAULT_CLOB_URL.into()),
            data_api_url: env::var("DATA_API_URL")
                .unwrap_or_else(|_| DEFAULT_DATA_API_URL.into()),
            egress_proxy_url: env::var("EGRESS_PROXY_URL").ok(),
            signature_type: env::var("POLYMARKET_SIGNATURE_TYPE")
                .unwrap_or_else(|_| "0".into())
                .parse()
                .unwrap_or(0),

            default_slippage_pct: env::var("DEFAULT_SLIPPAGE_PCT")
                .unwrap_or_else(|_| "2".into())
                .parse()
                .unwrap_or(Decimal::TWO),
            candidate_limit: env::var("CANDIDATE_LIMIT")
                .unwrap_or_else(|_| "500".into())
                .parse()
                .unwrap_or(500),

            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".into())
                .parse()
                .unwrap_or(587),
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM").ok(),
        })
    }

    /// Returns true if all Polymarket API credentials are configured.
    pub fn has_polymarket_auth(&self) -> bool {
        self.polymarket_api_key.is_some()
            && self.polymarket_api_secret.is_some()
            && self.polymarket_passphrase.is_some()
            && self.private_key.is_some()
    }

    /// Returns true if SMTP is fully configured.
    pub fn has_smtp(&self) -> bool {
        self.smtp_host.is_some()
            && self.smtp_username.is_some()
            && self.smtp_password.is_some()
            && self.smtp_from.is_some()
    }
}
