//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body is JSON, shaped the way shop clients already expect:
//! `{errors}` for token failures, `{success:false, message}` for validation
//! and lookups, `{success:false, errors}` for signup rejections,
//! `{success:0, message}` for uploads and `{error}` for payment failures.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::payments::PaymentError;
use crate::services::token::TokenError;
use crate::services::uploads::UploadError;

/// Message returned for any token failure.
pub const TOKEN_REJECTED: &str = "Please authenticate using valid token";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Token missing or invalid.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Signup, profile or account lookup failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Image upload failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Payment processor call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Missing or malformed request fields.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("User not found".to_owned()),
            other => Self::Database(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

fn message_body(success: Value, message: &str) -> Value {
    json!({ "success": success, "message": message })
}

const SERVER_ERROR: &str = "Server error";

impl AppError {
    /// Status code and JSON body for this error.
    fn parts(&self) -> (StatusCode, Value) {
        match self {
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                message_body(json!(false), SERVER_ERROR),
            ),
            Self::Token(err) => match err {
                TokenError::MissingToken | TokenError::InvalidToken => (
                    StatusCode::UNAUTHORIZED,
                    json!({ "errors": TOKEN_REJECTED }),
                ),
                TokenError::Signing(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message_body(json!(false), SERVER_ERROR),
                ),
            },
            Self::Auth(err) => match err {
                AuthError::MissingFields => (
                    StatusCode::BAD_REQUEST,
                    json!({ "success": false, "errors": "All fields are required" }),
                ),
                AuthError::InvalidEmail(_) => (
                    StatusCode::BAD_REQUEST,
                    json!({ "success": false, "errors": "Invalid email address" }),
                ),
                AuthError::UserAlreadyExists => (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "success": false,
                        "errors": "Existing user found with the same email",
                    }),
                ),
                AuthError::UserNotFound => {
                    (StatusCode::NOT_FOUND, message_body(json!(false), "User not found"))
                }
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Token(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message_body(json!(false), SERVER_ERROR),
                ),
            },
            Self::Catalog(err) => match err {
                CatalogError::Invalid(_) | CatalogError::Search(_) => {
                    (StatusCode::BAD_REQUEST, message_body(json!(false), &err.to_string()))
                }
                CatalogError::Repository(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message_body(json!(false), SERVER_ERROR),
                ),
            },
            Self::Upload(err) => match err {
                UploadError::Io(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message_body(json!(0), SERVER_ERROR),
                ),
                _ => (StatusCode::BAD_REQUEST, message_body(json!(0), &err.to_string())),
            },
            Self::Payment(err) => match err {
                PaymentError::InvalidAmount | PaymentError::InvalidCurrency => {
                    (StatusCode::BAD_REQUEST, message_body(json!(false), &err.to_string()))
                }
                PaymentError::Api { message, .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": message }),
                ),
                PaymentError::Http(_) | PaymentError::Parse(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": err.to_string() }),
                ),
            },
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, message_body(json!(false), msg)),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, message_body(json!(false), msg)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called once a request's token has been verified.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::Validation("invalid input".to_string());
        assert_eq!(err.to_string(), "Validation error: invalid input");
    }

    #[tokio::test]
    async fn test_token_errors_are_401_with_errors_body() {
        for err in [TokenError::MissingToken, TokenError::InvalidToken] {
            let (status, body) = render(AppError::Token(err)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({ "errors": TOKEN_REJECTED }));
        }
    }

    #[tokio::test]
    async fn test_validation_and_not_found_bodies() {
        let (status, body) = render(AppError::Validation("Query is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "message": "Query is required" }));

        let (status, body) = render(RepositoryError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn test_signup_conflict_is_400_with_errors_body() {
        let (status, body) = render(AppError::Auth(AuthError::UserAlreadyExists)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"], "Existing user found with the same email");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) = render(AppError::Internal("pool exhausted".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "success": false, "message": "Server error" }));
    }

    #[tokio::test]
    async fn test_upload_errors_use_numeric_success() {
        let (status, body) = render(AppError::Upload(UploadError::NoFiles)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": 0, "message": "No files uploaded" }));
    }

    #[tokio::test]
    async fn test_payment_api_error_passes_processor_message() {
        let err = PaymentError::Api {
            status: 402,
            message: "Your card was declined.".into(),
        };
        let (status, body) = render(AppError::Payment(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Your card was declined." }));
    }
}
