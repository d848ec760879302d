use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("SMTP connection failed: {0}")]
    SmtpConnection(String),

    #[error("failed to build email: {0}")]
    BuildEmail(String),
}

/// Email notification service. Sends are best-effort: failures are logged and
/// never block or roll back the state transition they report on.
pub struct Mailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    /// Build from config. Returns None when SMTP is not configured.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, MailerError> {
        if !config.has_smtp() {
            return Ok(None);
        }

        let host = config.smtp_host.as_deref().unwrap_or_default();
        let username = config.smtp_username.clone().unwrap_or_default();
        let password = config.smtp_password.clone().unwrap_or_default();
        let from_addr = config.smtp_from.as_deref().unwrap_or_default();

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| MailerError::SmtpConnection(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(username, password))
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();

        let from = from_addr
            .parse()
            .map_err(|e: lettre::address::AddressError| MailerError::BuildEmail(e.to_string()))?;

        Ok(Some(Self { mailer, from }))
    }

    /// Send a plain-text email. Returns true if the provider accepted it.
    async fn send_text(&self, to: &str, subject: &str, body: String) -> bool {
        let to_mailbox: Mailbox = match to.parse() {
            Ok(mb) => mb,
            Err(e) => {
                tracing::warn!(to, error = %e, "Invalid recipient address");
                return false;
            }
        };

        let email = match Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
        {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(to, error = %e, "Failed to build email");
                return false;
            }
        };

        match self.mailer.send(email).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(to, subject, error = %e, "Email send failed");
                false
            }
        }
    }

    /// The market a copied trade sits in has resolved.
    pub async fn send_market_resolved(
        &self,
        to: &str,
        question: &str,
        held_outcome: &str,
        winning_outcome: &str,
        won: bool,
    ) -> bool {
        let verdict = if won { "won" } else { "lost" };
        let body = format!(
            "The market \"{question}\" has resolved.\n\n\
             Resolved outcome: {winning_outcome}\n\
             Your side: {held_outcome}\n\n\
             Your position {verdict}.",
        );
        self.send_text(to, &format!("Market resolved: {question}"), body)
            .await
    }

    /// The copied trader exited their position before resolution.
    pub async fn send_trader_closed(&self, to: &str, question: &str, trader_wallet: &str) -> bool {
        let body = format!(
            "The trader you copied ({trader_wallet}) no longer holds a position in\n\
             \"{question}\".\n\n\
             If auto-close is enabled for this trade, it will be closed for you\n\
             automatically. Otherwise, consider reviewing the position.",
        );
        self.send_text(to, &format!("Trader exited: {question}"), body)
            .await
    }

    /// An auto-close order filled.
    pub async fn send_auto_close_success(
        &self,
        to: &str,
        question: &str,
        filled_size: Decimal,
        price: Decimal,
    ) -> bool {
        let proceeds = (filled_size * price).round_dp(2);
        let body = format!(
            "Auto-close executed for \"{question}\".\n\n\
             Shares closed: {filled_size}\n\
             Price: {price}\n\
             Proceeds: {proceeds} USDC",
        );
        self.send_text(to, &format!("Position auto-closed: {question}"), body)
            .await
    }

    /// An auto-close attempt failed. Sent only at escalation points; the
    /// terminal one tells the user to act.
    pub async fn send_auto_close_failure(
        &self,
        to: &str,
        question: &str,
        retry_count: i32,
        reason: &str,
        terminal: bool,
    ) -> bool {
        let action = if terminal {
            "Automatic retries have been exhausted. Please close this position manually."
        } else {
            "We will keep retrying automatically."
        };
        let body = format!(
            "Auto-close failed for \"{question}\" (attempt {retry_count}).\n\n\
             Reason: {reason}\n\n\
             {action}",
        );
        self.send_text(to, &format!("Auto-close failed: {question}"), body)
            .await
    }
}
