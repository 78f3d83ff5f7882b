//! Threadline storefront library.
//!
//! The JSON API behind the shop frontend: accounts, cart, favorites, catalog,
//! image uploads and payment intents. Exposed as a library so the router can
//! be tested and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderName, Method, StatusCode, header::CONTENT_TYPE},
    middleware::from_fn,
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::middleware::{AUTH_TOKEN_HEADER, request_id_middleware};
use crate::state::AppState;

/// Build the complete application router.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    let images = ServeDir::new(state.images().dir());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(AUTH_TOKEN_HEADER)]);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(state.config()))
        .nest_service("/images", images)
        .with_state(state)
        .layer(from_fn(request_id_middleware))
        .layer(trace)
        .layer(cors)
}

/// Root liveness string kept for clients that poll `/`.
async fn root() -> &'static str {
    "Threadline storefront is running"
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    //! Router tests against a pool that points at a closed port: every case
    //! here must be answered before any store access happens.

    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::Request;
    use serde_json::{Value, json};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use threadline_core::UserId;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::config::tests::test_config;
    use crate::error::TOKEN_REJECTED;

    const PEER: &str = "198.51.100.20:41000";

    fn state_with(config: StorefrontConfig) -> AppState {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://threadline@127.0.0.1:1/threadline_test")
            .unwrap();
        AppState::new(config, pool).unwrap()
    }

    fn test_state() -> AppState {
        state_with(test_config())
    }

    /// A JSON POST arriving from `PEER`, as `into_make_service_with_connect_info` records it.
    fn json_post(uri: &str) -> axum::http::request::Builder {
        let peer: SocketAddr = PEER.parse().unwrap();
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .extension(ConnectInfo(peer))
    }

    fn token(state: &AppState) -> String {
        state.tokens().issue(UserId::new(1)).unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    async fn post_json(
        state: AppState,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = json_post(uri);
        if let Some(token) = token {
            builder = builder.header(AUTH_TOKEN_HEADER, token);
        }
        send(state, builder.body(Body::from(body.to_string())).unwrap()).await
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, body) = send(test_state(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Threadline storefront is running"));

        let (status, body) =
            send(test_state(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("ok"));
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        for uri in ["/addtocart", "/removetocart", "/getcart", "/addfavorite", "/removefavorite"] {
            let (status, body) =
                post_json(test_state(), uri, None, json!({ "itemId": 5, "size": "M" })).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body, json!({ "errors": TOKEN_REJECTED }), "{uri}");
        }

        for uri in ["/getuser", "/getfavorites"] {
            let request = Request::get(uri).body(Body::empty()).unwrap();
            let (status, _) = send(test_state(), request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (status, body) = post_json(
            test_state(),
            "/addtocart",
            Some("garbage"),
            json!({ "itemId": 5, "size": "M" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"], TOKEN_REJECTED);
    }

    #[tokio::test]
    async fn test_cart_validation_precedes_store() {
        let state = test_state();
        let token = token(&state);

        let (status, body) = post_json(
            state.clone(),
            "/addtocart",
            Some(&token),
            json!({ "itemId": "abc", "size": "M" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "message": "Invalid item ID or size" }));

        let (status, body) =
            post_json(state, "/removetocart", Some(&token), json!({ "itemId": 5 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid itemId or size");
    }

    #[tokio::test]
    async fn test_favorite_validation_precedes_store() {
        let state = test_state();
        let token = token(&state);
        let (status, body) =
            post_json(state, "/addfavorite", Some(&token), json!({ "itemId": "x" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        for uri in ["/searchproducts", "/searchproducts?query=%20%20"] {
            let request = Request::get(uri).body(Body::empty()).unwrap();
            let (status, body) = send(test_state(), request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, json!({ "success": false, "message": "Query is required" }));
        }
    }

    #[tokio::test]
    async fn test_add_product_validation() {
        let (status, body) = post_json(
            test_state(),
            "/addproduct",
            None,
            json!({ "name": "  ", "category": "men", "new_price": 10, "old_price": 12 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "name is required");

        let (status, _) = post_json(
            test_state(),
            "/addproduct",
            None,
            json!({ "name": "Shirt", "category": "men", "new_price": -1, "old_price": 12 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_signup_missing_fields() {
        let (status, body) =
            post_json(test_state(), "/signup", None, json!({ "email": "a@x.com" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "errors": "All fields are required" }));
    }

    #[tokio::test]
    async fn test_upload_without_files() {
        let request = Request::post("/upload").body(Body::empty()).unwrap();
        let (status, body) = send(test_state(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": 0, "message": "No files uploaded" }));
    }

    #[tokio::test]
    async fn test_payment_intent_validation() {
        let (status, body) = post_json(
            test_state(),
            "/create-payment-intent",
            None,
            json!({ "amount": 0, "currency": "usd" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    /// Fire `count` empty logins at one router, rotating `X-Forwarded-For`.
    async fn login_statuses(router: Router, count: u8) -> Vec<StatusCode> {
        let mut statuses = Vec::new();
        for i in 0..count {
            let request = json_post("/login")
                .header("x-forwarded-for", format!("10.0.0.{i}"))
                .body(Body::from("{}"))
                .unwrap();
            statuses.push(router.clone().oneshot(request).await.unwrap().status());
        }
        statuses
    }

    #[tokio::test]
    async fn test_login_limited_per_peer_despite_forwarded_for() {
        let statuses = login_statuses(app(test_state()), 8).await;

        assert!(statuses[..5].iter().all(|s| *s == StatusCode::OK), "{statuses:?}");
        assert!(
            statuses[5..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS),
            "{statuses:?}"
        );
    }

    #[tokio::test]
    async fn test_trusted_proxy_headers_key_per_client() {
        let config = StorefrontConfig {
            trust_proxy_headers: true,
            ..test_config()
        };
        let statuses = login_statuses(app(state_with(config)), 8).await;

        assert!(statuses.iter().all(|s| *s == StatusCode::OK), "{statuses:?}");
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let request = Request::get("/health")
            .header("x-request-id", "edge-42")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "edge-42");
    }
}
