//! Signup and login handlers.
//!
//! Both are rate limited per client IP (see `middleware::rate_limit`).

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::services::{AuthService, LoginOutcome};
use crate::state::AppState;

/// Signup request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create an account and return its token.
///
/// POST /signup
#[instrument(skip(state, body))]
pub async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let token = AuthService::new(state.pool(), state.tokens())
        .signup(&body.name, &body.email, &body.password)
        .await?;

    Ok(Json(json!({ "success": true, "token": token })))
}

/// Check credentials and return a token.
///
/// POST /login
///
/// Wrong credentials are a normal `200` response with `success: false`.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let outcome = AuthService::new(state.pool(), state.tokens())
        .login(&body.email, &body.password)
        .await?;

    let response = match outcome {
        LoginOutcome::Authenticated(token) => json!({ "success": true, "token": token }),
        LoginOutcome::WrongPassword => {
            tracing::info!("Login rejected: wrong password");
            json!({ "success": false, "errors": "Wrong Password" })
        }
        LoginOutcome::UnknownEmail => {
            tracing::info!("Login rejected: unknown email");
            json!({ "success": false, "errors": "Wrong Email Id" })
        }
    };
    Ok(Json(response))
}
