use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EgressError {
    #[error("egress proxy unavailable: {0}")]
    Unavailable(String),
}

/// Healthcheck gate for the static-egress proxy that exchange submissions
/// ride through. When no proxy is configured the gate always passes
/// (direct-egress dev mode).
#[derive(Debug, Clone)]
pub struct EgressGate {
    http: Client,
    url: Option<String>,
}

impl EgressGate {
    pub fn new(http: Client, url: Option<String>) -> Self {
        Self { http, url }
    }

    /// Must succeed before any order submission.
    pub async fn check(&self) -> Result<(), EgressError> {
        let Some(url) = &self.url else {
            return Ok(());
        };

        match self.http.get(url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(EgressError::Unavailable(format!(
                "healthcheck returned {}",
                resp.status()
            ))),
            Err(e) => Err(EgressError::Unavailable(e.to_string())),
        }
    }
}
