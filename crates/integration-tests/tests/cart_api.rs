//! Cart API tests.
//!
//! Drives `/cart` end to end over in-memory stores: response shapes, merge
//! behavior, validation, ownership and the price snapshot rule.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use wardrobe_core::Price;
use wardrobe_integration_tests::{ALICE_TOKEN, BOB_TOKEN, TestApp, find_item, product};

// =============================================================================
// Full Flow
// =============================================================================

#[tokio::test]
async fn test_add_update_remove_flow() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);

    let res = app
        .add(
            ALICE_TOKEN,
            json!({"productId": shirt.id.to_string(), "size": "M"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["message"], "Linen Shirt (M) added to cart!");
    assert_eq!(res.body["cart"]["totalItems"], 1);
    assert_eq!(res.body["cart"]["items"][0]["quantity"], 1);

    let res = app
        .add(
            ALICE_TOKEN,
            json!({"productId": shirt.id.to_string(), "size": "L", "quantity": 2}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["cart"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(res.body["cart"]["totalItems"], 3);

    let cart = app.get_cart(ALICE_TOKEN).await;
    let medium_id = find_item(&cart.body["items"], shirt.id, "M").unwrap()["id"]
        .as_str()
        .unwrap()
        .to_owned();
    let large_id = find_item(&cart.body["items"], shirt.id, "L").unwrap()["id"]
        .as_str()
        .unwrap()
        .to_owned();

    let res = app.update(ALICE_TOKEN, &medium_id, json!({"quantity": 5})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Cart item updated");
    assert_eq!(res.body["totalItems"], 7);

    let res = app.remove(ALICE_TOKEN, &large_id).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Item removed from cart");
    assert_eq!(res.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["totalItems"], 5);
    assert_eq!(res.body["items"][0]["size"], "M");
    assert_eq!(res.body["items"][0]["product"]["name"], "Linen Shirt");
}

#[tokio::test]
async fn test_same_product_and_size_merges() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);
    let id = shirt.id.to_string();

    app.add(ALICE_TOKEN, json!({"productId": id, "size": "M"})).await;
    app.add(ALICE_TOKEN, json!({"productId": id, "size": "M", "quantity": 1}))
        .await;
    let res = app
        .add(ALICE_TOKEN, json!({"productId": id, "size": "M", "quantity": 3}))
        .await;

    assert_eq!(res.body["cart"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["cart"]["items"][0]["quantity"], 5);
    assert_eq!(res.body["cart"]["totalItems"], 5);
}

#[tokio::test]
async fn test_sizes_are_case_sensitive() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);
    let id = shirt.id.to_string();

    app.add(ALICE_TOKEN, json!({"productId": id, "size": "m"})).await;
    let res = app.add(ALICE_TOKEN, json!({"productId": id, "size": "M"})).await;

    assert_eq!(res.body["cart"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_routes_served_under_api_prefix() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);

    let res = app
        .request(
            Method::POST,
            "/api/cart",
            Some(ALICE_TOKEN),
            Some(json!({"productId": shirt.id.to_string(), "size": "S"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);

    let res = app
        .request(Method::GET, "/api/cart", Some(ALICE_TOKEN), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["totalItems"], 1);
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_get_without_cart_is_empty_and_creates_nothing() {
    let app = TestApp::with_products([]);

    let res = app.get_cart(ALICE_TOKEN).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"items": [], "totalItems": 0}));
    assert_eq!(app.carts.cart_count().await, 0);
}

#[tokio::test]
async fn test_item_keeps_price_snapshot() {
    let mut shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);
    app.add(
        ALICE_TOKEN,
        json!({"productId": shirt.id.to_string(), "size": "M"}),
    )
    .await;

    shirt.price = Price::from_cents(5000).unwrap();
    app.catalog.upsert(shirt).await;

    let res = app.get_cart(ALICE_TOKEN).await;
    let item = &res.body["items"][0];
    assert_eq!(item["price"], 45.0);
    assert_eq!(item["product"]["price"], 50.0);
}

#[tokio::test]
async fn test_deleted_product_joins_as_null() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);
    app.add(
        ALICE_TOKEN,
        json!({"productId": shirt.id.to_string(), "size": "M", "quantity": 2}),
    )
    .await;

    app.catalog.remove(shirt.id).await;

    let res = app.get_cart(ALICE_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["items"][0]["product"].is_null());
    assert_eq!(res.body["items"][0]["name"], "Linen Shirt");
    assert_eq!(res.body["totalItems"], 2);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_add_requires_product_and_size() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);

    for body in [
        json!({"size": "M"}),
        json!({"productId": shirt.id.to_string()}),
        json!({"productId": shirt.id.to_string(), "size": ""}),
        json!({}),
    ] {
        let res = app.add(ALICE_TOKEN, body).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["message"], "Please provide product ID and size.");
    }
    assert_eq!(app.carts.cart_count().await, 0);
}

#[tokio::test]
async fn test_add_rejects_bad_quantity() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);

    for quantity in [0, -3] {
        let res = app
            .add(
                ALICE_TOKEN,
                json!({"productId": shirt.id.to_string(), "size": "M", "quantity": quantity}),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            res.body["message"],
            "Quantity must be a positive whole number."
        );
    }
}

#[tokio::test]
async fn test_add_rejects_malformed_body() {
    let app = TestApp::with_products([]);

    let res = app
        .add(
            ALICE_TOKEN,
            json!({"productId": "x", "size": "M", "quantity": "lots"}),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["message"].is_string());
}

#[tokio::test]
async fn test_add_unknown_or_malformed_product() {
    let app = TestApp::with_products([]);

    let res = app
        .add(
            ALICE_TOKEN,
            json!({"productId": product("Ghost", 100).id.to_string(), "size": "M"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Product not found.");

    let res = app
        .add(ALICE_TOKEN, json!({"productId": "not-a-uuid", "size": "M"}))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_validates_quantity() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);
    let added = app
        .add(
            ALICE_TOKEN,
            json!({"productId": shirt.id.to_string(), "size": "M"}),
        )
        .await;
    let item_id = added.body["cart"]["items"][0]["id"]
        .as_str()
        .unwrap()
        .to_owned();

    for body in [json!({"quantity": 0}), json!({"quantity": -1}), json!({})] {
        let res = app.update(ALICE_TOKEN, &item_id, body).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            res.body["message"],
            "Quantity must be a positive whole number."
        );
    }

    let res = app.get_cart(ALICE_TOKEN).await;
    assert_eq!(res.body["totalItems"], 1);
}

// =============================================================================
// Not Found
// =============================================================================

#[tokio::test]
async fn test_update_and_remove_without_cart() {
    let app = TestApp::with_products([]);
    let item_id = "7d5f3c8e-1a2b-4c3d-9e8f-0a1b2c3d4e5f";

    let res = app.update(ALICE_TOKEN, item_id, json!({"quantity": 2})).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Cart not found.");

    let res = app.remove(ALICE_TOKEN, item_id).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Cart not found.");
}

#[tokio::test]
async fn test_update_and_remove_absent_item() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);
    app.add(
        ALICE_TOKEN,
        json!({"productId": shirt.id.to_string(), "size": "M"}),
    )
    .await;
    let absent = "7d5f3c8e-1a2b-4c3d-9e8f-0a1b2c3d4e5f";

    let res = app.update(ALICE_TOKEN, absent, json!({"quantity": 2})).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Item not found in cart.");

    let res = app.remove(ALICE_TOKEN, absent).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Item not found in cart.");

    let res = app.remove(ALICE_TOKEN, "not-a-uuid").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_items_are_scoped_to_owner() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);
    let added = app
        .add(
            ALICE_TOKEN,
            json!({"productId": shirt.id.to_string(), "size": "M"}),
        )
        .await;
    let alice_item = added.body["cart"]["items"][0]["id"]
        .as_str()
        .unwrap()
        .to_owned();

    app.add(
        BOB_TOKEN,
        json!({"productId": shirt.id.to_string(), "size": "L"}),
    )
    .await;

    let res = app.remove(BOB_TOKEN, &alice_item).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Item not found in cart.");

    let res = app.get_cart(ALICE_TOKEN).await;
    assert_eq!(res.body["totalItems"], 1);
    assert_eq!(app.carts.cart_count().await, 2);
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_cart_requires_token() {
    let app = TestApp::with_products([]);

    let res = app.request(Method::GET, "/cart", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Not authorized, no token");

    let res = app
        .request(Method::GET, "/cart", Some("stolen-token"), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Not authorized, token failed");
}

#[tokio::test]
async fn test_unauthorized_add_creates_nothing() {
    let shirt = product("Linen Shirt", 4500);
    let app = TestApp::with_products([shirt.clone()]);

    let res = app
        .request(
            Method::POST,
            "/cart",
            None,
            Some(json!({"productId": shirt.id.to_string(), "size": "M"})),
        )
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.carts.cart_count().await, 0);
}
