//! Account service.
//!
//! Signup, login, profile lookup and profile update.
//!
//! New passwords are stored as Argon2 PHC strings. Accounts created before
//! hashing was introduced still hold their password as submitted; login
//! compares those directly so they keep working.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use threadline_core::{Cart, Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;
use crate::services::token::TokenService;

/// Prefix shared by every Argon2 PHC string.
const ARGON2_PREFIX: &str = "$argon2";

/// Result of a login attempt that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials matched; carries a fresh token.
    Authenticated(String),
    /// The account exists but the password did not match.
    WrongPassword,
    /// No account uses this email.
    UnknownEmail,
}

/// Account service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a new account and return its token.
    ///
    /// The account starts with the legacy zeroed cart slots and no favorites.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if any field is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let name = name.trim();
        if name.is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, &password_hash, &Cart::with_legacy_slots())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Account created");
        Ok(self.tokens.issue(user.id)?)
    }

    /// Check an email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails. Wrong credentials
    /// are reported through `LoginOutcome`, not as errors.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(LoginOutcome::UnknownEmail);
        };

        let Some((user, stored)) = self.users.get_credentials(&email).await? else {
            return Ok(LoginOutcome::UnknownEmail);
        };

        if !verify_password(password, &stored) {
            return Ok(LoginOutcome::WrongPassword);
        }

        Ok(LoginOutcome::Authenticated(self.tokens.issue(user.id)?))
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Overwrite a user's name and email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if either field is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if another account uses the email.
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let name = name.trim();
        if name.is_empty() || email.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email)?;

        self.users
            .update_profile(user_id, name, &email)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against the stored credential.
///
/// PHC strings are checked with Argon2; anything else is a legacy plaintext
/// credential and must match exactly.
fn verify_password(password: &str, stored: &str) -> bool {
    if !stored.starts_with(ARGON2_PREFIX) {
        return password == stored;
    }

    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("p").unwrap();
        assert!(hash.starts_with(ARGON2_PREFIX));
        assert!(verify_password("p", &hash));
        assert!(!verify_password("q", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("p").unwrap(), hash_password("p").unwrap());
    }

    #[test]
    fn test_legacy_plaintext_credentials() {
        assert!(verify_password("hunter2", "hunter2"));
        assert!(!verify_password("hunter3", "hunter2"));
        assert!(!verify_password("", "hunter2"));
    }

    #[test]
    fn test_malformed_phc_string_never_matches() {
        assert!(!verify_password("$argon2id$broken", "$argon2id$broken"));
    }
}
