//! Identity token service.
//!
//! Tokens are HS256 JWTs whose payload is `{"user": {"id": <id>}}`. No expiry
//! claim is set or required: a token stays valid for as long as the signing
//! secret does.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use threadline_core::UserId;

/// Errors that can occur when issuing or verifying a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No token was supplied.
    #[error("missing token")]
    MissingToken,

    /// Signature invalid, payload malformed, or no user identifier in it.
    #[error("invalid token")]
    InvalidToken,

    /// The token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user: ClaimsUser,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaimsUser {
    id: UserId,
}

/// Stateless token issuer and verifier bound to one secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from the signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        let no_claims: &[&str] = &[];
        validation.set_required_spec_claims(no_claims);

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issue a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the payload cannot be signed.
    pub fn issue(&self, user: UserId) -> Result<String, TokenError> {
        let claims = Claims {
            user: ClaimsUser { id: user },
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token taken from a request and return the user it names.
    ///
    /// `None` and blank strings count as a missing token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MissingToken` or `TokenError::InvalidToken`.
    pub fn verify(&self, token: Option<&str>) -> Result<UserId, TokenError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TokenError::MissingToken)?;

        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.user.id)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected token");
                TokenError::InvalidToken
            })
    }
}
