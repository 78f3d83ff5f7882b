//! Token authentication extractor.
//!
//! Handlers that act on behalf of a user take [`RequireUser`]. The token is
//! read from the `auth-token` header and verified before the handler body
//! runs, so a bad token never reaches the store.

use axum::{extract::FromRequestParts, http::request::Parts};

use threadline_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::services::token::TokenError;
use crate::state::AppState;

/// Header carrying the signed identity token.
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// Extractor that requires a valid identity token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user_id): RequireUser) -> impl IntoResponse {
///     format!("Hello, user {user_id}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub UserId);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(AUTH_TOKEN_HEADER) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| TokenError::InvalidToken)?),
        };

        let user_id = state.tokens().verify(token)?;
        set_sentry_user(&user_id);

        Ok(Self(user_id))
    }
}
