//! Cart handlers (token required).
//!
//! `itemId` may arrive as a JSON number or string. Both it and `size` are
//! validated before the store is touched.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use threadline_core::{Cart, CartKey};

use super::raw_text;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::services::CartService;
use crate::state::AppState;

/// Cart mutation body.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CartRequest {
    pub item_id: Option<Value>,
    pub size: Option<Value>,
}

impl CartRequest {
    fn key(&self, message: &str) -> Result<CartKey> {
        CartKey::parse(
            &raw_text(self.item_id.as_ref()),
            &raw_text(self.size.as_ref()),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected cart key");
            AppError::Validation(message.to_owned())
        })
    }
}

/// Add one unit of an item/size to the caller's cart.
///
/// POST /addtocart
#[instrument(skip(state, body))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    body: std::result::Result<Json<CartRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let key = body.key("Invalid item ID or size")?;

    CartService::new(state.pool()).add(user_id, &key).await?;

    Ok(Json(json!({ "success": true })))
}

/// Remove one unit of an item/size from the caller's cart.
///
/// POST /removetocart
#[instrument(skip(state, body))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    body: std::result::Result<Json<CartRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let key = body.key("Invalid itemId or size")?;

    CartService::new(state.pool()).remove(user_id, &key).await?;

    Ok(Json(json!({ "success": true })))
}

/// The caller's whole cart map.
///
/// POST /getcart
#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool()).get(user_id).await?;
    Ok(Json(cart))
}
