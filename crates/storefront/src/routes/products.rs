//! Catalog handlers: create, delete and the three listings.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use threadline_core::{NewProduct, Product};

use super::parse_product_id;
use crate::error::{AppError, Result};
use crate::services::CatalogService;
use crate::state::AppState;

/// Product removal body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RemoveProductRequest {
    pub id: Option<Value>,
}

/// Create a product under the next identifier.
///
/// POST /addproduct
#[instrument(skip(state, body))]
pub async fn add_product(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewProduct>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(product) = body?;
    let first_image = product.first_image().map(str::to_owned);

    let created = CatalogService::new(state.pool()).add(product).await?;

    Ok(Json(json!({
        "success": 1,
        "name": created.name,
        "first_image": first_image,
    })))
}

/// Delete a product and strip it from every cart and favorites list.
///
/// POST /removeproduct
#[instrument(skip(state, body))]
pub async fn remove_product(
    State(state): State<AppState>,
    body: std::result::Result<Json<RemoveProductRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let id = parse_product_id(body.id.as_ref())
        .ok_or_else(|| AppError::Validation("Invalid product ID".to_owned()))?;

    CatalogService::new(state.pool()).remove(id).await?;

    Ok(Json(json!({
        "success": 1,
        "message": format!("Product {id} removed from Product collection, cart, and favorites"),
    })))
}

/// Every product, newest first.
///
/// GET /allproducts
#[instrument(skip(state))]
pub async fn all_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(CatalogService::new(state.pool()).all().await?))
}

/// GET /newcollections
#[instrument(skip(state))]
pub async fn new_collections(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(CatalogService::new(state.pool()).new_collections().await?))
}

/// GET /popularinwomen
#[instrument(skip(state))]
pub async fn popular_in_women(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(CatalogService::new(state.pool()).popular_in_women().await?))
}
