//! Product search handler.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::services::CatalogService;
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// Search product names.
///
/// GET /searchproducts?query=...
#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>> {
    let query = params.query.unwrap_or_default();
    let products = CatalogService::new(state.pool()).search(&query).await?;

    Ok(Json(json!({ "success": true, "products": products })))
}
