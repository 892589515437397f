//! # Application State
//!
//! Shared state for the Axum application: the order store, the optional
//! payment gateway, the mail notifier and the runtime configuration.

use crate::mail::notifier_from_env;
use crate::store::PgOrderStore;
use anyhow::Context;
use bakery_core::{BoxedNotifier, BoxedOrderStore, BoxedPaymentGateway, ShopError, ShopResult};
use bakery_yookassa::YooKassaGateway;
use std::sync::Arc;
use tracing::{info, warn};

/// Application configuration
#[derive(Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Postgres connection string
    pub database_url: String,
    pub database_max_connections: u32,
    /// Shared secret for the admin endpoint; `None` leaves it open
    pub admin_token: Option<String>,
    /// Where the gateway sends the customer after paying
    pub payment_return_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("database_url", &"[REDACTED]")
            .field("database_max_connections", &self.database_max_connections)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[REDACTED]"))
            .field("payment_return_url", &self.payment_return_url)
            .finish()
    }
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(p) => p.parse().with_context(|| format!("Invalid PORT: {}", p))?,
            None => 8080,
        };
        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(n) => n
                .parse()
                .with_context(|| format!("Invalid DATABASE_MAX_CONNECTIONS: {}", n))?,
            None => 5,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            database_url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections,
            admin_token: var("ADMIN_TOKEN"),
            payment_return_url: var("PAYMENT_RETURN_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: BoxedOrderStore,
    /// Absent when gateway credentials are not configured
    pub gateway: Option<BoxedPaymentGateway>,
    pub notifier: BoxedNotifier,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        store: BoxedOrderStore,
        gateway: Option<BoxedPaymentGateway>,
        notifier: BoxedNotifier,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            config,
        }
    }

    /// Build the production state: Postgres pool, YooKassa, SMTP
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = PgOrderStore::connect(&config.database_url, config.database_max_connections)
            .await
            .context("Failed to connect to the database")?;

        let gateway = match YooKassaGateway::from_env() {
            Ok(gateway) => {
                if gateway.config().is_test_mode() {
                    info!("YooKassa gateway in test mode");
                }
                Some(Arc::new(gateway) as BoxedPaymentGateway)
            }
            Err(e) => {
                warn!("Payment gateway disabled: {}", e);
                None
            }
        };

        if config.admin_token.is_none() {
            warn!("ADMIN_TOKEN is not set; the admin endpoint is unauthenticated");
        }

        Ok(Self::new(
            Arc::new(store),
            gateway,
            notifier_from_env(),
            config,
        ))
    }

    /// The configured gateway, or a configuration error
    pub fn gateway(&self) -> ShopResult<&BoxedPaymentGateway> {
        self.gateway.as_ref().ok_or_else(|| {
            ShopError::Configuration("Payment gateway is not configured".to_string())
        })
    }
}
