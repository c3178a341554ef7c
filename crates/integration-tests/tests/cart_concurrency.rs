//! Concurrent writers against one shopper's cart.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use wardrobe_integration_tests::{ALICE_TOKEN, TestApp, product};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_adds_share_one_cart() {
    let shirt = product("Linen Shirt", 4500);
    let app = Arc::new(TestApp::with_products([shirt.clone()]));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = Arc::clone(&app);
            let id = shirt.id.to_string();
            tokio::spawn(async move {
                app.add(ALICE_TOKEN, json!({"productId": id, "size": "M"}))
                    .await
                    .status
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
    }

    assert_eq!(app.carts.cart_count().await, 1);
    let res = app.get_cart(ALICE_TOKEN).await;
    assert_eq!(res.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["totalItems"], 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_of_different_sizes_are_all_kept() {
    let shirt = product("Linen Shirt", 4500);
    let app = Arc::new(TestApp::with_products([shirt.clone()]));
    app.add(
        ALICE_TOKEN,
        json!({"productId": shirt.id.to_string(), "size": "XS"}),
    )
    .await;

    let handles: Vec<_> = ["S", "M", "L", "XL"]
        .into_iter()
        .map(|size| {
            let app = Arc::clone(&app);
            let id = shirt.id.to_string();
            tokio::spawn(async move {
                app.add(
                    ALICE_TOKEN,
                    json!({"productId": id, "size": size, "quantity": 2}),
                )
                .await
                .status
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
    }

    let res = app.get_cart(ALICE_TOKEN).await;
    assert_eq!(res.body["items"].as_array().unwrap().len(), 5);
    assert_eq!(res.body["totalItems"], 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_update_racing_add_loses_nothing() {
    let shirt = product("Linen Shirt", 4500);
    let app = Arc::new(TestApp::with_products([shirt.clone()]));
    let id = shirt.id.to_string();
    let added = app
        .add(ALICE_TOKEN, json!({"productId": id, "size": "M"}))
        .await;
    let item_id = added.body["cart"]["items"][0]["id"]
        .as_str()
        .unwrap()
        .to_owned();

    let (update, add) = tokio::join!(
        app.update(ALICE_TOKEN, &item_id, json!({"quantity": 4})),
        app.add(ALICE_TOKEN, json!({"productId": id, "size": "L"})),
    );
    assert_eq!(update.status, StatusCode::OK);
    assert_eq!(add.status, StatusCode::CREATED);

    let res = app.get_cart(ALICE_TOKEN).await;
    assert_eq!(res.body["items"].as_array().unwrap().len(), 2);
    assert_eq!(res.body["totalItems"], 5);
}
