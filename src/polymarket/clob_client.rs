use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::Side;

use super::auth::ApiCredentials;
use super::signing::{OrderSigner, SignedOrder};
use super::types::{ApiMarket, OrderLookupResponse, PostOrderResponse, SubmitOutcome};

const CLOB_API_BASE: &str = "https://clob.polymarket.com";

#[derive(Debug, Error)]
pub enum ClobClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication error: {0}")]
    Auth(#[from] super::auth::AuthError),

    #[error("order signing failed: {0}")]
    Signing(String),

    #[error("no API credentials configured")]
    NoAuth,

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Order type sent alongside a signed order.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Gtc,
    Fok,
    /// Fill-and-kill: match what crosses, cancel the rest. Never rests.
    Fak,
    Gtd,
}

#[derive(Debug, Clone, Serialize)]
struct PostOrderRequest {
    order: SignedOrder,
    #[serde(rename = "orderType")]
    order_type: OrderType,
    /// API key of the order owner.
    owner: String,
}

/// Polymarket CLOB API client: market data plus authenticated order
/// submission and lookup.
#[derive(Debug, Clone)]
pub struct ClobClient {
    http: Client,
    base_url: String,
    auth: Option<(ApiCredentials, OrderSigner)>,
}

impl ClobClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: CLOB_API_BASE.into(),
            auth: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_auth(mut self, credentials: ApiCredentials, signer: OrderSigner) -> Self {
        self.auth = Some((credentials, signer));
        self
    }

    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    /// Fetch a single market (tokens, prices, tick size) by condition id.
    pub async fn get_market(&self, condition_id: &str) -> Result<ApiMarket, ClobClientError> {
        let url = format!("{}/markets/{}", self.base_url, condition_id);
        let resp = self.http.get(&url).send().await?.error_for_status()?;

        let market: ApiMarket = resp.json().await?;
        Ok(market)
    }

    /// Look an order up by id (authenticated).
    pub async fn lookup_order(
        &self,
        order_id: &str,
    ) -> Result<OrderLookupResponse, ClobClientError> {
        let (credentials, signer) = self.auth.as_ref().ok_or(ClobClientError::NoAuth)?;

        let path = format!("/data/order/{order_id}");
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = credentials.sign(&timestamp, "GET", &path, None)?;

        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .header("POLY_ADDRESS", format!("{:?}", signer.address()))
            .header("POLY_SIGNATURE", signature)
            .header("POLY_TIMESTAMP", &timestamp)
            .header("POLY_API_KEY", &credentials.api_key)
            .header("POLY_PASSPHRASE", &credentials.passphrase)
            .send()
            .await?
            .error_for_status()?;

        let lookup: OrderLookupResponse = resp.json().await?;
        Ok(lookup)
    }

    /// Sign and submit a fill-and-kill order for `size` outcome shares.
    ///
    /// Exchange rejections are data, not errors: they come back as
    /// `SubmitOutcome::Rejected`. Only transport/auth failures are `Err`.
    pub async fn submit_fak_order(
        &self,
        token_id: &str,
        side: Side,
        price: Decimal,
        size: Decimal,
    ) -> Result<SubmitOutcome, ClobClientError> {
        let (credentials, signer) = self.auth.as_ref().ok_or(ClobClientError::NoAuth)?;

        let signed = signer
            .sign_share_order(token_id, side, price, size)
            .await
            .map_err(|e| ClobClientError::Signing(e.to_string()))?;

        let request = PostOrderRequest {
            order: signed,
            order_type: OrderType::Fak,
            owner: credentials.api_key.clone(),
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| ClobClientError::Unexpected(e.to_string()))?;

        let path = "/order";
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = credentials.sign(&timestamp, "POST", path, Some(&body))?;

        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .header("POLY_ADDRESS", format!("{:?}", signer.address()))
            .header("POLY_SIGNATURE", signature)
            .header("POLY_TIMESTAMP", &timestamp)
            .header("POLY_API_KEY", &credentials.api_key)
            .header("POLY_PASSPHRASE", &credentials.passphrase)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, response = %text, "CLOB rejected order");
            return Ok(SubmitOutcome::Rejected {
                error_code: crate::models::order_event::event_error::EXCHANGE_REJECTED.into(),
                message: format!("{status}: {text}"),
            });
        }

        let parsed: PostOrderResponse = resp.json().await?;
        Ok(parsed.into_outcome())
    }
}
