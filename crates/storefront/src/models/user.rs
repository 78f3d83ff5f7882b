//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{Cart, Email, Favorites, UserId};

/// A shop account (domain type).
///
/// The stored credential is never part of this type; it is only read by the
/// login path through `UserRepository::get_credentials`.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
    /// Composite-key cart map.
    pub cart: Cart,
    /// Favorited products in insertion order.
    pub favorites: Favorites,
    /// When the user signed up.
    pub created_at: DateTime<Utc>,
}

/// Public summary returned by `/getuser`.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.as_str().to_owned(),
            date: user.created_at,
        }
    }
}

/// Full account view returned after a profile update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub cart_data: Cart,
    pub favorites: Favorites,
    pub date: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.into_inner(),
            cart_data: user.cart,
            favorites: user.favorites,
            date: user.created_at,
        }
    }
}
