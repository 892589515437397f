//! # SMTP Notifier
//!
//! Sends the new-order email to the bakery over STARTTLS with `lettre`.

use async_trait::async_trait;
use bakery_core::{
    render_order_email, BoxedNotifier, DisabledNotifier, Notifier, OrderNotification, ShopError,
    ShopResult,
};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Mail transport settings
#[derive(Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Operator inbox receiving order notifications
    pub recipient: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl MailConfig {
    /// Load from environment variables
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ShopResult<Self> {
        let var = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ShopError::Configuration(format!("{} not set", key)))
        };

        let port = match lookup("SMTP_PORT").filter(|v| !v.trim().is_empty()) {
            Some(p) => p
                .parse()
                .map_err(|_| ShopError::Configuration(format!("Invalid SMTP_PORT: {}", p)))?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            host: var("SMTP_HOST")?,
            port,
            user: var("SMTP_USER")?,
            password: var("SMTP_PASSWORD")?,
            recipient: var("BAKERY_EMAIL")?,
        })
    }
}

fn mailbox(address: &str) -> ShopResult<Mailbox> {
    address
        .parse()
        .map_err(|e| ShopError::Configuration(format!("Invalid mail address {}: {}", address, e)))
}

/// Notifier delivering through an authenticated SMTP relay
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> ShopResult<Self> {
        let from = mailbox(&config.user)?;
        let to = mailbox(&config.recipient)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| ShopError::Configuration(format!("SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(10)))
            .build();

        Ok(Self { transport, from, to })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, notification), fields(order_id = notification.order_id))]
    async fn notify_new_order(&self, notification: &OrderNotification) -> ShopResult<()> {
        let email = render_order_email(notification);

        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .map_err(|e| ShopError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ShopError::Network(format!("SMTP send failed: {}", e)))?;

        info!("Order notification sent");
        Ok(())
    }
}

/// SMTP when fully configured, otherwise a notifier that only logs
pub fn notifier_from_env() -> BoxedNotifier {
    match MailConfig::from_env().and_then(|config| SmtpNotifier::new(&config)) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            warn!("Order emails disabled: {}", e);
            Arc::new(DisabledNotifier)
        }
    }
}
