//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `ORDER_NUMBER_PREFIX` - Prefix for order numbers (default: MR)
//! - `SHIPPING_CACHE_TTL_SECS` - Zone catalog cache TTL (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Prefix for generated order numbers
    pub order_number_prefix: String,
    /// How long the shipping zone catalog is cached
    pub shipping_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = SecretString::from(require("STOREFRONT_DATABASE_URL")?);
        let base_url = require("STOREFRONT_BASE_URL")?;

        let host = match optional("STOREFRONT_HOST") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_owned(), raw))?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let port = match optional("STOREFRONT_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_owned(), raw))?,
            None => 3000,
        };
        let shipping_cache_ttl = match optional("SHIPPING_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar("SHIPPING_CACHE_TTL_SECS".to_owned(), raw)
            })?),
            None => Duration::from_secs(60),
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            order_number_prefix: optional("ORDER_NUMBER_PREFIX").unwrap_or_else(|| "MR".to_owned()),
            shipping_cache_ttl,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// The socket address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS (controls cookie flags).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
