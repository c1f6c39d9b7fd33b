//! Integration tests for Vitrinex.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p vitrinex-cli -- migrate
//!
//! # Start the server
//! cargo run -p vitrinex-server
//!
//! # Run the ignored end-to-end tests against it
//! cargo test -p vitrinex-integration-tests -- --ignored
//! ```
//!
//! Tests that only exercise the availability algorithm run without a server.
//!
//! # Test Categories
//!
//! - `availability` - Slot computation across schedules and reservations
//! - `booking_flow` - Owner setup, customer booking, double-booking conflict
//! - `order_flow` - Stock, totals, cancellation restock
//! - `chat_flow` - Unread counters and token access

use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("VITRINEX_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client with its own cookie jar, i.e. its own session.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Suffix that keeps emails and slugs unique across runs.
#[must_use]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(10).collect()
}

/// Read a JSON body, asserting the status first.
///
/// # Panics
///
/// Panics on an unexpected status or a non-JSON body.
pub async fn expect_json(resp: Response, status: StatusCode) -> Value {
    let actual = resp.status();
    let body: Value = resp.json().await.expect("Response is not JSON");
    assert_eq!(actual, status, "unexpected status, body: {body}");
    body
}

/// A logged-in owner with an open store.
pub struct OwnerSession {
    pub client: Client,
    pub slug: String,
    pub store: Value,
}

impl OwnerSession {
    /// Register a fresh owner and open a store in `mode`.
    ///
    /// # Panics
    ///
    /// Panics if registration or store creation fails.
    pub async fn open(mode: &str) -> Self {
        let client = client();
        let base = base_url();
        let suffix = unique_suffix();

        let resp = client
            .post(format!("{base}/api/auth/register"))
            .json(&json!({
                "email": format!("owner-{suffix}@example.com"),
                "name": "Integration Owner",
                "password": "integration-password",
            }))
            .send()
            .await
            .expect("Failed to register");
        expect_json(resp, StatusCode::CREATED).await;

        let slug = format!("it-{suffix}");
        let resp = client
            .post(format!("{base}/api/stores"))
            .json(&json!({ "slug": slug, "name": "Integration Store", "mode": mode }))
            .send()
            .await
            .expect("Failed to create store");
        let store = expect_json(resp, StatusCode::CREATED).await;

        Self {
            client,
            slug,
            store,
        }
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", base_url())
    }
}
