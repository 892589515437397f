//! # YooKassa Configuration
//!
//! Shop credentials are loaded from environment variables.

use bakery_core::ShopError;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.yookassa.ru/v3";

/// Upper bound for a single gateway round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// YooKassa API configuration
#[derive(Clone)]
pub struct YooKassaConfig {
    /// Shop identifier (basic auth user)
    pub shop_id: String,

    /// Secret key (basic auth password)
    pub secret_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Request timeout
    pub timeout: Duration,
}

impl YooKassaConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `YUKASSA_SHOP_ID`
    /// - `YUKASSA_SECRET_KEY`
    ///
    /// Optional:
    /// - `YUKASSA_API_BASE_URL`
    pub fn from_env() -> Result<Self, ShopError> {
        dotenvy::dotenv().ok();

        let required = |name: &str| {
            env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ShopError::Configuration(format!("{} not set", name)))
        };

        let shop_id = required("YUKASSA_SHOP_ID")?;
        let secret_key = required("YUKASSA_SECRET_KEY")?;

        let mut config = Self::new(shop_id, secret_key);
        if let Ok(url) = env::var("YUKASSA_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }
        Ok(config)
    }

    /// Create config with explicit values
    pub fn new(shop_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            shop_id: shop_id.into(),
            secret_key: secret_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if using a test shop (YooKassa test keys start with `test_`)
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("test_")
    }
}

impl std::fmt::Debug for YooKassaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YooKassaConfig")
            .field("shop_id", &self.shop_id)
            .field("secret_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = YooKassaConfig::new("123456", "test_secret");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.is_test_mode());
        assert!(!YooKassaConfig::new("1", "live_secret").is_test_mode());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = YooKassaConfig::new("1", "s").with_api_base_url("http://localhost:9000/");
        assert_eq!(config.api_base_url, "http://localhost:9000");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = YooKassaConfig::new("1", "test_very_secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("test_very_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_env_missing_key() {
        env::remove_var("YUKASSA_SHOP_ID");
        env::remove_var("YUKASSA_SECRET_KEY");

        let result = YooKassaConfig::from_env();
        assert!(matches!(result, Err(ShopError::Configuration(_))));
    }
}
