//! Integration tests for cart, favorites and the catalog cascade.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The storefront server running (cargo run -p threadline-storefront)
//!
//! Run with: cargo test -p threadline-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use threadline_integration_tests::Storefront;

async fn cart(shop: &Storefront, token: &str) -> Value {
    shop.post("/getcart", Some(token), &json!({}))
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid cart body")
}

async fn favorites(shop: &Storefront, token: &str) -> Value {
    shop.get("/getfavorites", Some(token))
        .await
        .expect("Failed to get favorites")
        .json()
        .await
        .expect("Invalid favorites body")
}

// ============================================================================
// Cart Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cart_add_and_remove() {
    let shop = Storefront::new();
    let (_email, token) = shop.signup("pw").await.expect("Signup failed");

    // Fresh accounts carry the legacy zeroed slots.
    let initial = cart(&shop, &token).await;
    assert_eq!(initial["1"], 0);

    for _ in 0..2 {
        let resp = shop
            .post("/addtocart", Some(&token), &json!({ "itemId": 7, "size": "M" }))
            .await
            .expect("Failed to add to cart");
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(cart(&shop, &token).await["7-M"], 2);

    for _ in 0..3 {
        shop.post("/removetocart", Some(&token), &json!({ "itemId": "7", "size": "M" }))
            .await
            .expect("Failed to remove from cart");
    }
    // Never below zero.
    assert_eq!(cart(&shop, &token).await["7-M"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_concurrent_cart_adds_are_not_lost() {
    let shop = Storefront::new();
    let (_email, token) = shop.signup("pw").await.expect("Signup failed");

    let adds = (0..10).map(|_| {
        let shop = shop.clone();
        let token = token.clone();
        tokio::spawn(async move {
            shop.post("/addtocart", Some(&token), &json!({ "itemId": 3, "size": "L" }))
                .await
                .expect("Failed to add to cart")
        })
    });
    for add in adds.collect::<Vec<_>>() {
        assert_eq!(add.await.expect("Task panicked").status(), StatusCode::OK);
    }

    assert_eq!(cart(&shop, &token).await["3-L"], 10);
}

// ============================================================================
// Favorites Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_favorites_are_a_set() {
    let shop = Storefront::new();
    let (_email, token) = shop.signup("pw").await.expect("Signup failed");

    let first: Value = shop
        .post("/addfavorite", Some(&token), &json!({ "itemId": 4 }))
        .await
        .expect("Failed to add favorite")
        .json()
        .await
        .expect("Invalid favorite body");
    assert_eq!(first["message"], "Added to favorites.");

    let second: Value = shop
        .post("/addfavorite", Some(&token), &json!({ "itemId": "4" }))
        .await
        .expect("Failed to add favorite")
        .json()
        .await
        .expect("Invalid favorite body");
    assert_eq!(second, json!({ "success": false, "message": "Already in favorites." }));
    assert_eq!(favorites(&shop, &token).await, json!([4]));

    for _ in 0..2 {
        let resp = shop
            .post("/removefavorite", Some(&token), &json!({ "itemId": 4 }))
            .await
            .expect("Failed to remove favorite");
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(favorites(&shop, &token).await, json!([]));
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_remove_product_cascades() {
    let shop = Storefront::new();
    let (_email, token) = shop.signup("pw").await.expect("Signup failed");
    let name = format!("Cascade Tee {}", Uuid::new_v4());
    let id = shop.create_product(&name).await.expect("Failed to create product");

    shop.post("/addtocart", Some(&token), &json!({ "itemId": id, "size": "M" }))
        .await
        .expect("Failed to add to cart");
    shop.post("/addfavorite", Some(&token), &json!({ "itemId": id }))
        .await
        .expect("Failed to add favorite");

    let body: Value = shop
        .post("/removeproduct", None, &json!({ "id": id }))
        .await
        .expect("Failed to remove product")
        .json()
        .await
        .expect("Invalid removal body");
    assert_eq!(body["success"], 1);

    let cart = cart(&shop, &token).await;
    assert!(cart.get(format!("{id}-M")).is_none());
    let favorites = favorites(&shop, &token).await;
    assert!(!favorites.as_array().is_some_and(|f| f.contains(&json!(id))));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_search_finds_exact_and_fuzzy() {
    let shop = Storefront::new();
    let marker = Uuid::new_v4().simple().to_string();
    let name = format!("Linen Blazer {marker}");
    shop.create_product(&name).await.expect("Failed to create product");

    let resp = shop
        .get(&format!("/searchproducts?query={marker}"), None)
        .await
        .expect("Failed to search");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Invalid search body");
    assert_eq!(body["success"], true);
    assert_eq!(body["products"][0]["name"], name.as_str());

    let resp = shop
        .get("/searchproducts?query=", None)
        .await
        .expect("Failed to search");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_listings() {
    let shop = Storefront::new();
    let all: Value = shop
        .get("/allproducts", None)
        .await
        .expect("Failed to list")
        .json()
        .await
        .expect("Invalid listing");
    assert!(all.is_array());

    let new: Value = shop
        .get("/newcollections", None)
        .await
        .expect("Failed to list")
        .json()
        .await
        .expect("Invalid listing");
    assert!(new.as_array().is_some_and(|n| n.len() <= 8));

    let popular: Value = shop
        .get("/popularinwomen", None)
        .await
        .expect("Failed to list")
        .json()
        .await
        .expect("Invalid listing");
    assert!(popular.as_array().is_some_and(|p| p.len() <= 4));
}
