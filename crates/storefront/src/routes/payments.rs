//! Payment intent handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::services::IntentRequest;
use crate::state::AppState;

/// Payment intent body. `amount` is in the currency's smallest unit.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PaymentIntentRequest {
    pub amount: Option<Value>,
    pub currency: Option<String>,
}

/// Create a card payment intent and hand its client secret to the browser.
///
/// POST /create-payment-intent
#[instrument(skip(state, body))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    body: std::result::Result<Json<PaymentIntentRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let request = IntentRequest::new(body.amount.as_ref(), body.currency.as_deref())?;

    let client_secret = state.payments().create_intent(&request).await?;

    Ok(Json(json!({ "clientSecret": client_secret })))
}
