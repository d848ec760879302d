use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid API secret encoding: {0}")]
    SecretEncoding(String),

    #[error("failed to create HMAC: {0}")]
    Hmac(String),
}

/// API credentials for authenticated CLOB requests (L2 auth).
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret,
            passphrase,
        }
    }

    /// Sign a request with HMAC-SHA256 for L2 authentication.
    /// The signed message is `timestamp + method + path + body`.
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<String, AuthError> {
        let message = match body {
            Some(b) => format!("{timestamp}{method}{path}{b}"),
            None => format!("{timestamp}{method}{path}"),
        };

        // Polymarket issues URL-safe base64 secrets; fall back to standard
        // base64 for compatibility.
        let secret_bytes = base64::engine::general_purpose::URL_SAFE
            .decode(&self.api_secret)
            .or_else(|_| {
                base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(&self.api_secret)
            })
            .or_else(|_| base64::engine::general_purpose::STANDARD.decode(&self.api_secret))
            .map_err(|e| AuthError::SecretEncoding(e.to_string()))?;

        let mut mac = Hmac::<Sha256>::new_from_slice(&secret_bytes)
            .map_err(|e| AuthError::Hmac(e.to_string()))?;
        mac.update(message.as_bytes());
        let result = mac.finalize();

        Ok(base64::engine::general_purpose::URL_SAFE.encode(result.into_bytes()))
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> ApiCredentials {
        ApiCredentials::new(
            "test-key".into(),
            base64::engine::general_purpose::STANDARD.encode("test-secret"),
            "test-passphrase".into(),
        )
    }

    #[test]
    fn sign_produces_url_safe_base64() {
        let signature = test_credentials()
            .sign("1700000000", "POST", "/order", Some(r#"{"order":"data"}"#))
            .unwrap();

        assert!(base64::engine::general_purpose::URL_SAFE
            .decode(&signature)
            .is_ok());
    }

    #[test]
    fn sign_without_body() {
        let signature = test_credentials()
            .sign("1700000000", "GET", "/data/order/0x1", None)
            .unwrap();

        assert!(!signature.is_empty());
    }

    #[test]
    fn debug_does_not_expose_secrets() {
        let debug_str = format!("{:?}", test_credentials());
        assert!(!debug_str.contains("test-key"));
        assert!(!debug_str.contains("test-passphrase"));
    }
}
