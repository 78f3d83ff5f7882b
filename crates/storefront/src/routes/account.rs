//! Account handlers (token required).

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{UserProfile, UserSummary};
use crate::services::AuthService;
use crate::state::AppState;

/// Profile update body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
}

/// Name, email and signup date of the caller.
///
/// GET /getuser
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Value>> {
    let user = AuthService::new(state.pool(), state.tokens())
        .get_user(user_id)
        .await?;

    Ok(Json(json!({ "success": true, "user": UserSummary::from(&user) })))
}

/// Overwrite the caller's name and email.
///
/// PUT /updateprofile
#[instrument(skip(state, body))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    body: std::result::Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let user = AuthService::new(state.pool(), state.tokens())
        .update_profile(user_id, &body.name, &body.email)
        .await?;

    Ok(Json(json!({ "success": true, "user": UserProfile::from(user) })))
}
