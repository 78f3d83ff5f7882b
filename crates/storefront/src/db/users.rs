//! User repository for database operations.
//!
//! Cart and favorites are mutated under a row lock: the current value is read
//! with `SELECT ... FOR UPDATE`, changed by a rule from `threadline-core`, and
//! written back in the same transaction, so concurrent requests for the same
//! user are serialised instead of losing updates.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use threadline_core::{Cart, Email, Favorites, ProductId, UserId};

use super::RepositoryError;
use crate::models::User;

/// Database row for `shop.user` without the credential column.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    cart_data: Json<Cart>,
    favorites: Vec<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            cart: row.cart_data.0,
            favorites: favorites_from_column(row.favorites),
            created_at: row.created_at,
        })
    }
}

/// Row used by the login path, which is the only reader of the credential.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: String,
}

fn favorites_from_column(ids: Vec<i32>) -> Favorites {
    Favorites::from(ids.into_iter().map(ProductId::new).collect::<Vec<_>>())
}

const USER_COLUMNS: &str = "id, name, email, cart_data, favorites, created_at";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user together with their stored credential.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password FROM shop.user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password))),
            None => Ok(None),
        }
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password: &str,
        cart: &Cart,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO shop.user (name, email, password, cart_data)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(name)
        .bind(email.as_str())
        .bind(password)
        .bind(Json(cart))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?;

        User::try_from(row)
    }

    /// Overwrite a user's name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if another account already uses the email.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE shop.user
            SET name = $2, email = $3
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(name)
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }

    /// Apply `change` to a user's cart under a row lock and persist the result.
    ///
    /// Returns whatever `change` returns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if any statement fails; nothing is written then.
    pub async fn update_cart<T>(
        &self,
        id: UserId,
        change: impl FnOnce(&mut Cart) -> T + Send,
    ) -> Result<T, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (Json(mut cart),): (Json<Cart>,) =
            sqlx::query_as("SELECT cart_data FROM shop.user WHERE id = $1 FOR UPDATE")
                .bind(id.as_i32())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let outcome = change(&mut cart);

        sqlx::query("UPDATE shop.user SET cart_data = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(Json(&cart))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(outcome)
    }

    /// Apply `change` to a user's favorites under a row lock and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if any statement fails; nothing is written then.
    pub async fn update_favorites<T>(
        &self,
        id: UserId,
        change: impl FnOnce(&mut Favorites) -> T + Send,
    ) -> Result<T, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (ids,): (Vec<i32>,) =
            sqlx::query_as("SELECT favorites FROM shop.user WHERE id = $1 FOR UPDATE")
                .bind(id.as_i32())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let mut favorites = favorites_from_column(ids);
        let outcome = change(&mut favorites);

        sqlx::query("UPDATE shop.user SET favorites = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(Vec::<i32>::from(favorites))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(outcome)
    }
}

/// Remove every trace of `product` from all carts and favorites.
///
/// Runs on the caller's connection so it can share the product delete's
/// transaction. Returns the number of accounts changed.
pub(crate) async fn strip_product(
    conn: &mut PgConnection,
    product: ProductId,
) -> Result<u64, RepositoryError> {
    let flat_key = product.to_string();
    let size_prefix = format!("{flat_key}-");

    let rows: Vec<(i32, Json<Cart>, Vec<i32>)> = sqlx::query_as(
        r"
        SELECT id, cart_data, favorites
        FROM shop.user
        WHERE $3 = ANY(favorites)
           OR EXISTS (
               SELECT 1 FROM jsonb_object_keys(cart_data) AS k
               WHERE k = $1 OR starts_with(k, $2)
           )
        FOR UPDATE
        ",
    )
    .bind(&flat_key)
    .bind(&size_prefix)
    .bind(product.as_i32())
    .fetch_all(&mut *conn)
    .await?;

    let mut changed = 0;
    for (id, Json(mut cart), ids) in rows {
        let mut favorites = favorites_from_column(ids);
        let removed_keys = cart.strip_product(product);
        let removed_favorite = favorites.remove(product);
        if removed_keys == 0 && !removed_favorite {
            continue;
        }

        sqlx::query("UPDATE shop.user SET cart_data = $2, favorites = $3 WHERE id = $1")
            .bind(id)
            .bind(Json(&cart))
            .bind(Vec::<i32>::from(favorites))
            .execute(&mut *conn)
            .await?;
        changed += 1;
    }

    Ok(changed)
}
