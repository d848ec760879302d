use reqwest::Client;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::ApiPosition;

const DATA_API_BASE: &str = "https://data-api.polymarket.com";

/// Page size for the positions endpoint; the API caps pages at 100 entries.
const POSITIONS_PAGE_SIZE: usize = 100;

/// Safety valve against a runaway pagination loop.
const MAX_POSITION_PAGES: usize = 50;

#[derive(Debug, Error)]
pub enum DataClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

#[derive(Debug, Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: DATA_API_BASE.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch a wallet's current open-position size for one market/outcome,
    /// paging through the positions endpoint until a short page.
    ///
    /// A wallet with no matching entry holds nothing: returns zero. Sizes are
    /// clamped to >= 0.
    pub async fn get_position_size(
        &self,
        wallet: &str,
        condition_id: &str,
        outcome: &str,
    ) -> Result<Decimal, DataClientError> {
        let mut offset = 0usize;
        let limit = POSITIONS_PAGE_SIZE.to_string();

        for _ in 0..MAX_POSITION_PAGES {
            let url = format!("{}/positions", self.base_url);
            let offset_param = offset.to_string();
            let resp = self
                .http
                .get(&url)
                .query(&[
                    ("user", wallet),
                    ("limit", limit.as_str()),
                    ("offset", offset_param.as_str()),
                ])
                .send()
                .await?
                .error_for_status()?;

            let page: Vec<ApiPosition> = resp.json().await?;

            for pos in &page {
                let condition_matches = pos
                    .condition_id
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(condition_id));
                let outcome_matches = pos
                    .outcome
                    .as_deref()
                    .is_some_and(|o| o.eq_ignore_ascii_case(outcome));

                if condition_matches && outcome_matches {
                    let size = pos.size.unwrap_or(Decimal::ZERO);
                    return Ok(size.max(Decimal::ZERO));
                }
            }

            if page.len() < POSITIONS_PAGE_SIZE {
                return Ok(Decimal::ZERO);
            }
            offset += page.len();
        }

        tracing::warn!(
            wallet,
            condition_id,
            pages = MAX_POSITION_PAGES,
            "Position pagination safety limit reached"
        );
        Ok(Decimal::ZERO)
    }
}
