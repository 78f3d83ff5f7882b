//! Integration test helpers for the Threadline storefront.
//!
//! These tests talk to a running server over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate a scratch database and start the server
//! cargo run -p threadline-cli -- migrate
//! cargo run -p threadline-storefront
//!
//! # Run the ignored tests against it
//! cargo test -p threadline-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` overrides the default `http://localhost:4000`.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, header::RETRY_AFTER};
use serde_json::{Value, json};
use uuid::Uuid;

/// Header carrying the session token.
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// Result of a multi-step helper; errors cross spawned tasks.
pub type HelperResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// How many times a rate-limited request is retried.
pub const RATE_LIMIT_RETRIES: u32 = 10;

/// Delay the server asked for, or one replenish period when it gave none.
fn retry_after(response: &Response) -> Duration {
    let seconds = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(6);
    Duration::from_secs(seconds)
}

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string())
}

/// A fresh email address so runs never collide.
#[must_use]
pub fn unique_email() -> String {
    format!("integration-{}@example.com", Uuid::new_v4())
}

/// Thin client bound to the storefront base URL.
#[derive(Clone)]
pub struct Storefront {
    client: Client,
    base_url: String,
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new()
    }
}

impl Storefront {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: storefront_base_url(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// POST a JSON body, optionally with a token.
    ///
    /// Signup and login are rate limited per client address; a `429` is
    /// retried after the server's `retry-after` delay, up to
    /// [`RATE_LIMIT_RETRIES`] times.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the request cannot be sent.
    pub async fn post(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<Response, reqwest::Error> {
        let mut attempt = 0;
        loop {
            let mut request = self.client.post(self.url(path)).json(body);
            if let Some(token) = token {
                request = request.header(AUTH_TOKEN_HEADER, token);
            }
            let response = request.send().await?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS || attempt == RATE_LIMIT_RETRIES {
                return Ok(response);
            }
            attempt += 1;
            tokio::time::sleep(retry_after(&response)).await;
        }
    }

    /// GET a path, optionally with a token.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the request cannot be sent.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<Response, reqwest::Error> {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.header(AUTH_TOKEN_HEADER, token);
        }
        request.send().await
    }

    /// Sign up a new account and return its email and token.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or a message if signup was refused.
    pub async fn signup(&self, password: &str) -> HelperResult<(String, String)> {
        let email = unique_email();
        let body: Value = self
            .post(
                "/signup",
                None,
                &json!({ "name": "Integration", "email": email, "password": password }),
            )
            .await?
            .json()
            .await?;

        let token = body["token"]
            .as_str()
            .ok_or_else(|| format!("signup refused: {body}"))?
            .to_owned();
        Ok((email, token))
    }

    /// Create a product and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or a message if the product is not listed.
    pub async fn create_product(&self, name: &str) -> HelperResult<i64> {
        self.post(
            "/addproduct",
            None,
            &json!({
                "name": name,
                "category": "women",
                "images": ["http://localhost:4000/images/test.png"],
                "new_price": 50.0,
                "old_price": 80.5,
                "sizes": [{ "name": "M", "quantity": 3 }],
            }),
        )
        .await?
        .error_for_status()?;

        let products: Value = self.get("/allproducts", None).await?.json().await?;
        products
            .as_array()
            .and_then(|all| all.iter().find(|p| p["name"] == name))
            .and_then(|p| p["id"].as_i64())
            .ok_or_else(|| format!("product {name} not listed").into())
    }
}
