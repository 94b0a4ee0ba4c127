//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (same database
//!   the storefront writes orders to)
//! - `CARRIER_API_URL` - Base URL of the carrier REST API
//! - `CARRIER_API_KEY` - Carrier API key
//! - `STORE_NAME` - Sender name printed on shipments
//! - `STORE_ADDRESS_LINE1` - Sender street address
//! - `STORE_CITY` - Sender city
//! - `STORE_POSTAL_CODE` - Sender postal code
//! - `STORE_COUNTRY` - Sender country (two-letter code)
//! - `STORE_PHONE` - Sender contact phone
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `STORE_ADDRESS_LINE2` - Additional sender address line
//! - `STORE_EMAIL` - Sender contact email
//! - `CARRIER_TIMEOUT_SECS` - Carrier request timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use marram_core::CountryCode;

use crate::carrier::StoreAddress;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Carrier API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct CarrierConfig {
    /// Base URL of the carrier REST API.
    pub api_url: Url,
    /// API key sent with every request.
    pub api_key: SecretString,
    /// Request timeout; a timeout is a transport failure, not a rejection.
    pub timeout: Duration,
}

impl std::fmt::Debug for CarrierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Carrier API configuration
    pub carrier: CarrierConfig,
    /// Sender address for shipment bookings
    pub store_address: StoreAddress,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = SecretString::from(require("ADMIN_DATABASE_URL")?);

        let host = match optional("ADMIN_HOST") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("ADMIN_HOST".to_owned(), raw))?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let port = match optional("ADMIN_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("ADMIN_PORT".to_owned(), raw))?,
            None => 3001,
        };

        let api_url_raw = require("CARRIER_API_URL")?;
        let api_url = Url::parse(&api_url_raw)
            .map_err(|_| ConfigError::InvalidEnvVar("CARRIER_API_URL".to_owned(), api_url_raw))?;
        let timeout = match optional("CARRIER_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar("CARRIER_TIMEOUT_SECS".to_owned(), raw)
            })?),
            None => Duration::from_secs(30),
        };
        let carrier = CarrierConfig {
            api_url,
            api_key: SecretString::from(require("CARRIER_API_KEY")?),
            timeout,
        };

        let country_raw = require("STORE_COUNTRY")?;
        let country = CountryCode::parse(&country_raw)
            .map_err(|_| ConfigError::InvalidEnvVar("STORE_COUNTRY".to_owned(), country_raw))?;
        let store_address = StoreAddress {
            name: require("STORE_NAME")?,
            line1: require("STORE_ADDRESS_LINE1")?,
            line2: optional("STORE_ADDRESS_LINE2"),
            city: require("STORE_CITY")?,
            postal_code: require("STORE_POSTAL_CODE")?,
            country,
            phone: require("STORE_PHONE")?,
            email: optional("STORE_EMAIL"),
        };

        Ok(Self {
            database_url,
            host,
            port,
            carrier,
            store_address,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// The socket address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
