//! Payment processor client for creating payment intents.
//!
//! Speaks the processor's form-encoded REST API with bearer authentication.
//! The base URL comes from configuration so tests can point it elsewhere.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::StripeConfig;

/// Errors that can occur when creating a payment intent.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Amount missing, not an integer, or not positive.
    #[error("Amount must be a positive integer in the smallest currency unit")]
    InvalidAmount,

    /// Currency missing or not a three-letter code.
    #[error("Currency must be a three-letter code")]
    InvalidCurrency,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Processor returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A validated charge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    amount: u64,
    currency: String,
}

impl IntentRequest {
    /// Validate a raw amount and currency.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` unless `amount` is a positive
    /// integer, and `PaymentError::InvalidCurrency` unless `currency` is three
    /// ASCII letters.
    pub fn new(
        amount: Option<&serde_json::Value>,
        currency: Option<&str>,
    ) -> Result<Self, PaymentError> {
        let amount = amount
            .and_then(serde_json::Value::as_u64)
            .filter(|a| *a > 0)
            .ok_or(PaymentError::InvalidAmount)?;

        let currency = currency
            .map(str::trim)
            .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
            .ok_or(PaymentError::InvalidCurrency)?
            .to_ascii_lowercase();

        Ok(Self { amount, currency })
    }

    fn form(&self) -> [(&'static str, String); 3] {
        [
            ("amount", self.amount.to_string()),
            ("currency", self.currency.clone()),
            ("payment_method_types[]", "card".to_owned()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Payment processor API client.
#[derive(Clone, Debug)]
pub struct PaymentClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl PaymentClient {
    /// Create a new payment client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value, the base URL
    /// cannot be joined, or the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| PaymentError::Parse(format!("Invalid API key format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let endpoint = config
            .api_base
            .join("/v1/payment_intents")
            .map_err(|e| PaymentError::Parse(format!("Invalid API base: {e}")))?;

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Create a card payment intent and return its client secret.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Api` with the processor's message if it rejects
    /// the request.
    #[tracing::instrument(
        skip(self),
        fields(amount = request.amount, currency = %request.currency)
    )]
    pub async fn create_intent(&self, request: &IntentRequest) -> Result<String, PaymentError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&request.form())
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or(text);
            tracing::warn!(status = status.as_u16(), %message, "Payment intent rejected");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        intent
            .client_secret
            .ok_or_else(|| PaymentError::Parse("response has no client_secret".to_owned()))
    }
}
