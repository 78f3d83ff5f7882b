//! Cart service.
//!
//! Each mutation is one locked read-modify-write through `UserRepository`,
//! with the counting rules coming from `threadline_core::Cart`.

use sqlx::PgPool;

use threadline_core::{Cart, CartKey, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::error::add_breadcrumb;

/// Cart service.
pub struct CartService<'a> {
    users: UserRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Add one unit of `key` to the user's cart. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    #[tracing::instrument(skip(self, key), fields(key = %key))]
    pub async fn add(&self, user: UserId, key: &CartKey) -> Result<u32, RepositoryError> {
        let quantity = self.users.update_cart(user, |cart| cart.add(key)).await?;
        add_breadcrumb("cart", "Added to cart", &[("key", &key.to_string())]);
        tracing::debug!(quantity, "Cart entry incremented");
        Ok(quantity)
    }

    /// Remove one unit of `key` from the user's cart if any are present.
    /// Returns the quantity left.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    #[tracing::instrument(skip(self, key), fields(key = %key))]
    pub async fn remove(&self, user: UserId, key: &CartKey) -> Result<u32, RepositoryError> {
        let quantity = self.users.update_cart(user, |cart| cart.remove(key)).await?;
        add_breadcrumb("cart", "Removed from cart", &[("key", &key.to_string())]);
        tracing::debug!(quantity, "Cart entry decremented");
        Ok(quantity)
    }

    /// The user's whole cart, zero-valued slots included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn get(&self, user: UserId) -> Result<Cart, RepositoryError> {
        self.users
            .get_by_id(user)
            .await?
            .map(|u| u.cart)
            .ok_or(RepositoryError::NotFound)
    }
}
