//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Liveness string
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness (database)
//! GET  /images/{file}          - Uploaded product images
//!
//! # Accounts (rate limited)
//! POST /signup                 - Create account, returns token
//! POST /login                  - Check credentials, returns token
//!
//! # Account (auth-token header)
//! GET  /getuser                - Name, email, signup date
//! PUT  /updateprofile          - Overwrite name and email
//!
//! # Cart (auth-token header)
//! POST /addtocart              - Increment "<itemId>-<size>"
//! POST /removetocart           - Decrement "<itemId>-<size>" (never below 0)
//! POST /getcart                - Whole cart map
//!
//! # Favorites (auth-token header)
//! POST /addfavorite            - Set-insert
//! POST /removefavorite         - Idempotent remove
//! GET  /getfavorites           - Ordered item IDs
//!
//! # Catalog
//! POST /addproduct             - Create with next identifier
//! POST /removeproduct          - Delete and cascade to carts/favorites
//! GET  /allproducts            - Newest first
//! GET  /newcollections         - Identifier order, skip 1, take 8
//! GET  /popularinwomen         - Identifier order, first 4
//! GET  /searchproducts         - Exact then fuzzy name search
//!
//! # Uploads and payments
//! POST /upload                 - Multipart "product" files (max 10)
//! POST /create-payment-intent  - Card payment intent client secret
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod favorites;
pub mod payments;
pub mod products;
pub mod search;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use serde_json::Value;

use threadline_core::ProductId;

use crate::config::StorefrontConfig;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the signup/login router, rate limited per client IP.
pub fn auth_routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter(trust_proxy_headers))
}

/// Create the token-protected account, cart and favorites router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/getuser", get(account::get_user))
        .route("/updateprofile", put(account::update_profile))
        .route("/addtocart", post(cart::add_to_cart))
        .route("/removetocart", post(cart::remove_from_cart))
        .route("/getcart", post(cart::get_cart))
        .route("/addfavorite", post(favorites::add_favorite))
        .route("/removefavorite", post(favorites::remove_favorite))
        .route("/getfavorites", get(favorites::get_favorites))
}

/// Create the catalog router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/addproduct", post(products::add_product))
        .route("/removeproduct", post(products::remove_product))
        .route("/allproducts", get(products::all_products))
        .route("/newcollections", get(products::new_collections))
        .route("/popularinwomen", get(products::popular_in_women))
        .route("/searchproducts", get(search::search_products))
}

/// Create the upload and payment router.
pub fn commerce_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(upload::UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent),
        )
}

/// Create all API routes.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .merge(auth_routes(config.trust_proxy_headers))
        .merge(user_routes())
        .merge(catalog_routes())
        .merge(commerce_routes())
}

/// Text form of a JSON scalar as a client would have typed it.
///
/// Numbers and strings keep their text; anything else is empty.
pub(crate) fn raw_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Product identifier from a JSON number or numeric string.
pub(crate) fn parse_product_id(value: Option<&Value>) -> Option<ProductId> {
    match value? {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()).map(ProductId::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
