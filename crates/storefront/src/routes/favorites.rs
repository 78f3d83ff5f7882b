//! Favorites handlers (token required).

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use threadline_core::{Favorites, ProductId};

use super::parse_product_id;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::services::FavoritesService;
use crate::state::AppState;

/// Favorites mutation body.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub item_id: Option<Value>,
}

impl FavoriteRequest {
    fn product(&self) -> Result<ProductId> {
        parse_product_id(self.item_id.as_ref())
            .ok_or_else(|| AppError::Validation("Invalid item ID".to_owned()))
    }
}

/// Add an item to the caller's favorites.
///
/// POST /addfavorite
///
/// An item that is already a favorite answers `success: false`, not an error.
#[instrument(skip(state, body))]
pub async fn add_favorite(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    body: std::result::Result<Json<FavoriteRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let product = body.product()?;

    let added = FavoritesService::new(state.pool())
        .add(user_id, product)
        .await?;

    Ok(Json(if added {
        json!({ "success": true, "message": "Added to favorites." })
    } else {
        json!({ "success": false, "message": "Already in favorites." })
    }))
}

/// Remove an item from the caller's favorites. Absent items are fine.
///
/// POST /removefavorite
#[instrument(skip(state, body))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    body: std::result::Result<Json<FavoriteRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let product = body.product()?;

    FavoritesService::new(state.pool())
        .remove(user_id, product)
        .await?;

    Ok(Json(json!({ "success": true, "message": "Removed from favorites." })))
}

/// The caller's favorites in insertion order.
///
/// GET /getfavorites
#[instrument(skip(state))]
pub async fn get_favorites(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Favorites>> {
    let favorites = FavoritesService::new(state.pool()).list(user_id).await?;
    Ok(Json(favorites))
}
