//! Integration tests for signup, login and profile endpoints.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The storefront server running (cargo run -p threadline-storefront)
//!
//! Run with: cargo test -p threadline-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use threadline_integration_tests::{Storefront, unique_email};

// ============================================================================
// Signup & Login Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_signup_then_login() {
    let shop = Storefront::new();
    let (email, _token) = shop.signup("hunter22").await.expect("Signup failed");

    let resp = shop
        .post("/login", None, &json!({ "email": email, "password": "hunter22" }))
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Invalid login body");
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_login_failures_are_soft() {
    let shop = Storefront::new();
    let (email, _token) = shop.signup("right-password").await.expect("Signup failed");

    let body: Value = shop
        .post("/login", None, &json!({ "email": email, "password": "wrong" }))
        .await
        .expect("Failed to log in")
        .json()
        .await
        .expect("Invalid login body");
    assert_eq!(body, json!({ "success": false, "errors": "Wrong Password" }));

    let body: Value = shop
        .post(
            "/login",
            None,
            &json!({ "email": unique_email(), "password": "whatever" }),
        )
        .await
        .expect("Failed to log in")
        .json()
        .await
        .expect("Invalid login body");
    assert_eq!(body, json!({ "success": false, "errors": "Wrong Email Id" }));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_duplicate_signup_rejected() {
    let shop = Storefront::new();
    let (email, _token) = shop.signup("pw").await.expect("Signup failed");

    let resp = shop
        .post(
            "/signup",
            None,
            &json!({ "name": "Again", "email": email, "password": "pw" }),
        )
        .await
        .expect("Failed to sign up");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Invalid signup body");
    assert_eq!(body["errors"], "Existing user found with the same email");
}

// ============================================================================
// Profile Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_get_user_and_update_profile() {
    let shop = Storefront::new();
    let (email, token) = shop.signup("pw").await.expect("Signup failed");

    let body: Value = shop
        .get("/getuser", Some(&token))
        .await
        .expect("Failed to get user")
        .json()
        .await
        .expect("Invalid user body");
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], email.as_str());
    assert!(body["user"].get("password").is_none());

    let new_email = unique_email();
    let resp = shop
        .client()
        .put(shop.url("/updateprofile"))
        .header("auth-token", &token)
        .json(&json!({ "name": "Renamed", "email": new_email }))
        .send()
        .await
        .expect("Failed to update profile");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Invalid profile body");
    assert_eq!(body["user"]["name"], "Renamed");
    assert_eq!(body["user"]["email"], new_email.as_str());
    assert!(body["user"]["cartData"].is_object());
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_token_required() {
    let shop = Storefront::new();
    let resp = shop.get("/getuser", None).await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = shop
        .get("/getuser", Some("not-a-token"))
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
