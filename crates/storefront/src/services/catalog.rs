//! Catalog service: product create/delete, listings and search.

use sqlx::PgPool;
use thiserror::Error;

use threadline_core::search::{SearchError, search_products};
use threadline_core::{NewProduct, Product, ProductError, ProductId};

use crate::db::RepositoryError;
use crate::db::products::{ProductRepository, Removal};

/// Products skipped at the start of the new-collection listing.
const NEW_COLLECTION_SKIP: i64 = 1;
/// Products in the new-collection listing.
const NEW_COLLECTION_SIZE: i64 = 8;
/// Products in the popular-in-women listing.
const POPULAR_SIZE: i64 = 4;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Product input failed validation.
    #[error("{0}")]
    Invalid(#[from] ProductError),

    /// Search query failed validation.
    #[error("{0}")]
    Search(#[from] SearchError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// Validate and insert a product under the next identifier.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` if a required field is blank.
    pub async fn add(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let product = product.validate()?;
        let created = self.products.create(&product).await?;
        tracing::info!(product_id = %created.id, name = %created.name, "Product added");
        Ok(created)
    }

    /// Delete a product and every cart and favorites reference to it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the delete fails.
    pub async fn remove(&self, id: ProductId) -> Result<Removal, CatalogError> {
        let removal = self.products.delete(id).await?;
        tracing::info!(
            product_id = %id,
            deleted = removal.deleted,
            accounts_updated = removal.accounts_updated,
            "Product removed"
        );
        Ok(removal)
    }

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn all(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_newest_first().await?)
    }

    /// Eight products in identifier order, skipping the first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn new_collections(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .products
            .page_by_id(NEW_COLLECTION_SKIP, Some(NEW_COLLECTION_SIZE))
            .await?)
    }

    /// The first four products in identifier order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn popular_in_women(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.page_by_id(0, Some(POPULAR_SIZE)).await?)
    }

    /// Search product names, exact substring first with a typo-tolerant fallback.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Search` for a blank query, checked before the
    /// catalog is loaded.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery.into());
        }
        let catalog = self.products.list_by_id().await?;
        let results = search_products(query, catalog)?;
        tracing::debug!(query, hits = results.len(), "Catalog searched");
        Ok(results)
    }
}
