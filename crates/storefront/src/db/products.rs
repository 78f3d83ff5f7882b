//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use threadline_core::{NewProduct, Price, Product, ProductId, SizeStock, next_product_id};

use super::RepositoryError;
use super::users::strip_product;

/// Database row for `shop.product`.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    images: Vec<String>,
    category: String,
    new_price: Decimal,
    old_price: Decimal,
    sizes: Json<Vec<SizeStock>>,
    created_at: DateTime<Utc>,
    available: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = |value: Decimal| {
            Price::new(value).map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid price for product {}: {e}",
                    row.id
                ))
            })
        };

        Ok(Self {
            id: ProductId::new(row.id),
            new_price: price(row.new_price)?,
            old_price: price(row.old_price)?,
            name: row.name,
            images: row.images,
            category: row.category,
            sizes: row.sizes.0,
            date: row.created_at,
            available: row.available,
        })
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, images, category, new_price, old_price, sizes, created_at, available";

/// Outcome of deleting a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// Whether a product row was deleted.
    pub deleted: bool,
    /// Accounts whose cart or favorites referenced the product.
    pub accounts_updated: u64,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product with the next identifier.
    ///
    /// The table is locked for the duration of the transaction so two
    /// concurrent creates cannot read the same maximum.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the identifier space is exhausted.
    /// Returns `RepositoryError::Database` for database errors.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("LOCK TABLE shop.product IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let (current_max,): (Option<i32>,) = sqlx::query_as("SELECT MAX(id) FROM shop.product")
            .fetch_one(&mut *tx)
            .await?;
        let id = next_product_id(current_max.map(ProductId::new))
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO shop.product (id, name, images, category, new_price, old_price, sizes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(&product.name)
        .bind(&product.images)
        .bind(&product.category)
        .bind(product.new_price.amount())
        .bind(product.old_price.amount())
        .bind(Json(&product.sizes))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product id"))?;

        tx.commit().await?;

        Product::try_from(row)
    }

    /// Delete a product and strip it from every cart and favorites list.
    ///
    /// Both happen in one transaction. Deleting an unknown identifier is not
    /// an error; stale references to it are still cleaned up.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is changed then.
    pub async fn delete(&self, id: ProductId) -> Result<Removal, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;
        let accounts_updated = strip_product(&mut *tx, id).await?;

        tx.commit().await?;

        Ok(Removal {
            deleted,
            accounts_updated,
        })
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_newest_first(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// All products in identifier order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_id(&self) -> Result<Vec<Product>, RepositoryError> {
        self.page_by_id(0, None).await
    }

    /// A window of products in identifier order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn page_by_id(
        &self,
        offset: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }
}
