//! Integration tests for the storefront checkout pipeline.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations and the seed fixture
//! - The storefront server running (cargo run -p marram-storefront)
//!
//! Run with: cargo test -p marram-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use marram_integration_tests::TestContext;

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_cart_page_creates_nothing() {
    let ctx = TestContext::new();

    let resp = ctx
        .client
        .get(format!("{}/cart", ctx.storefront_url))
        .send()
        .await
        .expect("cart request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("cart body");
    assert_eq!(body["item_count"], 0);
    assert_eq!(body["subtotal"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_add_to_cart_then_checkout_summary() {
    let ctx = TestContext::new();

    // Seeded product 1 is Sea Salt at 900 cents / 250 g.
    let resp = ctx
        .client
        .post(format!("{}/cart/items", ctx.storefront_url))
        .json(&json!({ "product_id": 1, "quantity": 2 }))
        .send()
        .await
        .expect("add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("cart body");
    assert_eq!(cart["item_count"], 2);

    let resp = ctx
        .client
        .get(format!("{}/checkout", ctx.storefront_url))
        .send()
        .await
        .expect("checkout summary");
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: Value = resp.json().await.expect("summary body");
    assert_eq!(summary["subtotal"], 1800);
    assert_eq!(summary["total_weight"], 500);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_empty_checkout_reports_cart_empty() {
    let ctx = TestContext::new();

    let resp = ctx
        .client
        .get(format!("{}/checkout", ctx.storefront_url))
        .send()
        .await
        .expect("checkout request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["error"], "cart_empty");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_shipping_methods_reject_bad_country() {
    let ctx = TestContext::new();

    for query in ["", "?country=FRA", "?country=F1"] {
        let resp = ctx
            .client
            .get(format!("{}/shipping/methods{query}", ctx.storefront_url))
            .send()
            .await
            .expect("methods request");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {query:?}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_shipping_methods_for_wildcard_country() {
    let ctx = TestContext::new();

    // No seeded zone lists US, so only the wildcard zone's methods apply.
    let resp = ctx
        .client
        .get(format!("{}/shipping/methods?country=us", ctx.storefront_url))
        .send()
        .await
        .expect("methods request");
    assert_eq!(resp.status(), StatusCode::OK);
    let methods: Value = resp.json().await.expect("methods body");
    let names: Vec<&str> = methods
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|m| m["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Worldwide"]);
}
