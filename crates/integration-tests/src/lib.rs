//! Integration tests for Marram.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! cargo run -p marram-cli -- migrate
//! cargo run -p marram-cli -- seed
//!
//! # Start both servers
//! cargo run -p marram-storefront &
//! cargo run -p marram-admin &
//!
//! # Run the ignored end-to-end tests
//! cargo test -p marram-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_checkout` - cart, shipping listing, and checkout flow
//! - `admin_labels` - shipment booking and label retrieval

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::Client;

/// Shared context for end-to-end tests.
pub struct TestContext {
    /// Cookie-keeping HTTP client (carts live in the session).
    pub client: Client,
    /// Storefront base URL.
    pub storefront_url: String,
    /// Admin base URL.
    pub admin_url: String,
}

impl TestContext {
    /// Build a context from environment variables with local defaults.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create HTTP client"),
            storefront_url: std::env::var("STOREFRONT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_owned()),
            admin_url: std::env::var("ADMIN_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_owned()),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
