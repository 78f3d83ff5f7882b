//! Favorites service.

use sqlx::PgPool;

use threadline_core::{Favorites, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;

/// Favorites service.
pub struct FavoritesService<'a> {
    users: UserRepository<'a>,
}

impl<'a> FavoritesService<'a> {
    /// Create a new favorites service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Append `product` to the user's favorites.
    ///
    /// Returns `false`, without writing anything new, when it was already there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn add(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        self.users
            .update_favorites(user, |favorites| favorites.insert(product))
            .await
    }

    /// Remove `product` from the user's favorites if present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, user: UserId, product: ProductId) -> Result<(), RepositoryError> {
        let removed = self
            .users
            .update_favorites(user, |favorites| favorites.remove(product))
            .await?;
        tracing::debug!(removed, "Favorite removal applied");
        Ok(())
    }

    /// The user's favorites in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn list(&self, user: UserId) -> Result<Favorites, RepositoryError> {
        self.users
            .get_by_id(user)
            .await?
            .map(|u| u.favorites)
            .ok_or(RepositoryError::NotFound)
    }
}
