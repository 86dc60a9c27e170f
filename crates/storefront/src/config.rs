//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`). Without one, orders and sessions are kept in memory.
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `STOREFRONT_CATALOG` - Catalog document, a file path or `http(s)` URL
//!   (default: crates/storefront/static/products.json)
//! - `STOREFRONT_SHIPPING_FEE` - Flat shipping fee in minor units (default: 9900)
//! - `STOREFRONT_ORDER_SERVICE_URL` - Remote order service base URL. When unset,
//!   orders are saved in-process.
//! - `STOREFRONT_ORDER_TIMEOUT_SECS` - Order submission timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use wallposter_core::Price;

/// Default catalog location, relative to the workspace root.
pub const DEFAULT_CATALOG_SOURCE: &str = "crates/storefront/static/products.json";

const DEFAULT_SHIPPING_FEE: &str = "9900";
const DEFAULT_ORDER_TIMEOUT_SECS: &str = "15";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the catalog document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Local JSON file.
    File(std::path::PathBuf),
    /// JSON document fetched over HTTP.
    Url(Url),
}

impl CatalogSource {
    /// Interpret a configured value: `http(s)://` values are URLs, anything
    /// else is a file path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if an `http(s)` value does not parse.
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Url::parse(value)
                .map(Self::Url)
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        } else {
            Ok(Self::File(value.into()))
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Catalog document location
    pub catalog: CatalogSource,
    /// Flat shipping fee for a non-empty cart
    pub shipping_fee: Price,
    /// Remote order service, if orders are not saved in-process
    pub order_service_url: Option<Url>,
    /// Upper bound on one order submission
    pub order_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL");
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let catalog = CatalogSource::parse(
            "STOREFRONT_CATALOG",
            &get_env_or_default("STOREFRONT_CATALOG", DEFAULT_CATALOG_SOURCE),
        )?;
        let shipping_fee = parse_shipping_fee(
            "STOREFRONT_SHIPPING_FEE",
            &get_env_or_default("STOREFRONT_SHIPPING_FEE", DEFAULT_SHIPPING_FEE),
        )?;
        let order_service_url = get_optional_env("STOREFRONT_ORDER_SERVICE_URL")
            .map(|value| {
                Url::parse(&value).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "STOREFRONT_ORDER_SERVICE_URL".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;
        let order_timeout = parse_timeout(
            "STOREFRONT_ORDER_TIMEOUT_SECS",
            &get_env_or_default("STOREFRONT_ORDER_TIMEOUT_SECS", DEFAULT_ORDER_TIMEOUT_SECS),
        )?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            catalog,
            shipping_fee,
            order_service_url,
            order_timeout,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_shipping_fee(key: &str, value: &str) -> Result<Price, ConfigError> {
    let minor = value
        .trim()
        .parse::<i64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if minor < 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(Price::from_minor(minor))
}

fn parse_timeout(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1 second".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: None,
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            catalog: CatalogSource::File(DEFAULT_CATALOG_SOURCE.into()),
            shipping_fee: Price::from_minor(9900),
            order_service_url: None,
            order_timeout: Duration::from_secs(15),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_secure_cookies_follow_base_url() {
        let mut config = config();
        assert!(!config.is_secure());
        config.base_url = "https://posters.example.in".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_catalog_source_file_or_url() {
        assert_eq!(
            CatalogSource::parse("K", "data/products.json").unwrap(),
            CatalogSource::File("data/products.json".into())
        );
        assert!(matches!(
            CatalogSource::parse("K", "https://cdn.example.in/products.json").unwrap(),
            CatalogSource::Url(_)
        ));
        assert!(matches!(
            CatalogSource::parse("K", "http://"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_parse_shipping_fee() {
        assert_eq!(parse_shipping_fee("K", "99").unwrap(), Price::from_minor(99));
        assert_eq!(parse_shipping_fee("K", "0").unwrap(), Price::ZERO);
        assert!(parse_shipping_fee("K", "-1").is_err());
        assert!(parse_shipping_fee("K", "ninety").is_err());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("K", "15").unwrap(), Duration::from_secs(15));
        assert!(parse_timeout("K", "0").is_err());
        assert!(parse_timeout("K", "soon").is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let mut config = config();
        config.database_url = Some(SecretString::from("postgres://user:hunter2@db/shop"));
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
