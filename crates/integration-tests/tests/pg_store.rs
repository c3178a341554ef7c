//! `PostgreSQL` store tests.
//!
//! These run the production SQL against a real database and are ignored by
//! default. Point `DATABASE_URL` at a scratch database and run:
//!
//! ```bash
//! cargo test -p wardrobe-integration-tests --test pg_store -- --ignored
//! ```
//!
//! Migrations are applied on connect. Every test creates its own user and
//! products, so tests can share one database and run in parallel.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;

use wardrobe_core::{LineItemData, Price, Product, ProductId, Quantity, Size, UserId};
use wardrobe_integration_tests::product;
use wardrobe_storefront::db::{
    self, CartStore, PgCartStore, PgProductCatalog, ProductCatalog, RepositoryError,
    UserRepository,
};
use wardrobe_storefront::services::auth::TokenService;
use wardrobe_storefront::services::cart::{CartError, CartService};

// ============================================================================
// Helpers
// ============================================================================

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

async fn new_user(pool: &PgPool) -> UserId {
    UserRepository::new(pool)
        .create("Test Shopper")
        .await
        .expect("Failed to create user")
        .id
}

async fn stocked(pool: &PgPool, name: &str, cents: i64) -> Product {
    let product = product(name, cents);
    PgProductCatalog::new(pool.clone())
        .upsert(&product)
        .await
        .expect("Failed to upsert product");
    product
}

fn service(pool: &PgPool) -> CartService {
    CartService::new(
        Arc::new(PgCartStore::new(pool.clone())),
        Arc::new(PgProductCatalog::new(pool.clone())),
    )
}

fn line(product: &Product, size: &str, quantity: i64) -> LineItemData {
    LineItemData::snapshot(
        product,
        Size::parse(size).unwrap(),
        Quantity::try_from_i64(quantity).unwrap(),
    )
}

// ============================================================================
// Cart Store
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_add_merges_same_key_in_one_cart() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let shirt = stocked(&pool, "Linen Shirt", 4500).await;
    let store = PgCartStore::new(pool.clone());

    let first = store.add_or_increment(user, line(&shirt, "M", 1)).await.unwrap();
    store.add_or_increment(user, line(&shirt, "M", 1)).await.unwrap();
    let merged = store.add_or_increment(user, line(&shirt, "M", 3)).await.unwrap();
    let other = store.add_or_increment(user, line(&shirt, "L", 2)).await.unwrap();

    assert_eq!(merged.id(), first.id());
    assert_eq!(merged.items().len(), 1);
    assert_eq!(merged.items()[0].quantity().get(), 5);
    assert_eq!(other.items().len(), 2);
    assert_eq!(other.items()[1].size().as_str(), "L");
    assert_eq!(other.total_items(), 7);
    assert_eq!(first.version(), 1);
    assert_eq!(other.version(), 4);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_create_conflicts_for_existing_cart() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let store = PgCartStore::new(pool.clone());

    let cart = store.create(user).await.unwrap();
    assert!(cart.items().is_empty());
    assert!(matches!(
        store.create(user).await,
        Err(RepositoryError::Conflict(_))
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_merge_past_max_quantity_changes_nothing() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let shirt = stocked(&pool, "Linen Shirt", 4500).await;
    let store = PgCartStore::new(pool.clone());
    let max = i64::from(Quantity::MAX);

    let before = store.add_or_increment(user, line(&shirt, "M", max)).await.unwrap();
    let result = store.add_or_increment(user, line(&shirt, "M", 1)).await;
    assert!(matches!(result, Err(RepositoryError::OutOfRange(_))));

    let after = store.find_by_user(user).await.unwrap().unwrap();
    assert_eq!(after.version(), before.version());
    assert_eq!(after.items()[0].quantity().get(), Quantity::MAX);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_failed_first_add_leaves_no_cart() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let store = PgCartStore::new(pool.clone());
    // Larger than numeric(12,2) allows, so the item insert fails after the
    // cart row was written in the same transaction.
    let mut huge = product("Gold Coat", 0);
    huge.price = Price::from_cents(10_000_000_000_000).unwrap();

    let result = store.add_or_increment(user, line(&huge, "M", 1)).await;

    assert!(result.is_err());
    assert!(store.find_by_user(user).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_stale_save_conflicts() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let shirt = stocked(&pool, "Linen Shirt", 4500).await;
    let store = PgCartStore::new(pool.clone());

    store.add_or_increment(user, line(&shirt, "M", 1)).await.unwrap();
    let stale = store.find_by_user(user).await.unwrap().unwrap();
    store.add_or_increment(user, line(&shirt, "L", 1)).await.unwrap();

    assert!(matches!(
        store.save(&stale).await,
        Err(RepositoryError::Conflict(_))
    ));
    let stored = store.find_by_user(user).await.unwrap().unwrap();
    assert_eq!(stored.items().len(), 2);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_save_deletes_removed_and_updates_kept_items() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let shirt = stocked(&pool, "Linen Shirt", 4500).await;
    let store = PgCartStore::new(pool.clone());

    store.add_or_increment(user, line(&shirt, "M", 1)).await.unwrap();
    let mut cart = store.add_or_increment(user, line(&shirt, "L", 2)).await.unwrap();
    let medium = cart.items()[0].id();
    let large = cart.items()[1].id();

    cart.set_quantity(medium, Quantity::try_from_i64(5).unwrap()).unwrap();
    cart.remove_item(large).unwrap();
    let saved = store.save(&cart).await.unwrap();

    assert_eq!(saved.version(), cart.version() + 1);
    let stored = store.find_by_user(user).await.unwrap().unwrap();
    assert_eq!(stored.items().len(), 1);
    assert_eq!(stored.items()[0].id(), medium);
    assert_eq!(stored.total_items(), 5);
}

// ============================================================================
// Cart Service over PostgreSQL
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_service_flow() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let shirt = stocked(&pool, "Linen Shirt", 4500).await;
    let service = service(&pool);
    let id = shirt.id.to_string();

    service.add_item(user, Some(&id), Some("M"), None).await.unwrap();
    let added = service.add_item(user, Some(&id), Some("L"), Some(2)).await.unwrap();
    assert_eq!(added.cart.total_items(), 3);

    let medium = added.cart.items()[0].id().to_string();
    let large = added.cart.items()[1].id().to_string();
    let updated = service.update_item_quantity(user, &medium, Some(5)).await.unwrap();
    assert_eq!(updated.total_items, 7);

    let removed = service.remove_item(user, &large).await.unwrap();
    assert_eq!(removed.items.len(), 1);
    assert_eq!(removed.total_items, 5);
    assert_eq!(removed.items[0].product.as_ref().unwrap().id, shirt.id);

    let err = service
        .add_item(user, Some(&id), Some("M"), Some(i64::from(Quantity::MAX)))
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::Validation(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires PostgreSQL"]
async fn test_add_racing_update_never_fails() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let shirt = stocked(&pool, "Linen Shirt", 4500).await;
    let service = service(&pool);
    let id = shirt.id.to_string();

    let added = service.add_item(user, Some(&id), Some("M"), None).await.unwrap();
    let item_id = added.cart.items()[0].id().to_string();

    for _ in 0..100 {
        let (add, update) = tokio::join!(
            service.add_item(user, Some(&id), Some("M"), None),
            service.update_item_quantity(user, &item_id, Some(3)),
        );
        add.unwrap();
        update.unwrap();
    }

    let contents = service.get_cart(user).await.unwrap();
    assert_eq!(contents.items.len(), 1);
    let quantity = contents.items[0].item.quantity().get();
    assert!((3..=4).contains(&quantity), "quantity {quantity}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires PostgreSQL"]
async fn test_concurrent_first_adds_share_one_cart() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let shirt = stocked(&pool, "Linen Shirt", 4500).await;
    let service = Arc::new(service(&pool));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let id = shirt.id.to_string();
            tokio::spawn(async move { service.add_item(user, Some(&id), Some("M"), None).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let contents = service.get_cart(user).await.unwrap();
    assert_eq!(contents.items.len(), 1);
    assert_eq!(contents.total_items, 8);
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_catalog_upsert_and_batch_lookup() {
    let pool = pool().await;
    let catalog = PgProductCatalog::new(pool.clone());
    let mut coat = stocked(&pool, "Wool Coat", 19_900).await;
    let tee = stocked(&pool, "Cotton Tee", 1500).await;

    coat.price = Price::from_cents(17_500).unwrap();
    catalog.upsert(&coat).await.unwrap();

    let found = catalog.find_product(coat.id).await.unwrap().unwrap();
    assert_eq!(found.price, coat.price);

    let batch = catalog
        .find_products(&[coat.id, tee.id, ProductId::generate()])
        .await
        .unwrap();
    assert_eq!(batch.len(), 2);

    let listed: Vec<ProductId> = catalog
        .list_products()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .filter(|id| *id == coat.id || *id == tee.id)
        .collect();
    assert_eq!(listed, [tee.id, coat.id]);
}

// ============================================================================
// Users and Tokens
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_token_issue_resolve_revoke() {
    let pool = pool().await;
    let user = new_user(&pool).await;
    let pepper = SecretString::from("kQ3$vN8!pZ2@xR5#mW7&tY0*bH4^cJ6%");
    let tokens = TokenService::new(&pool, &pepper);

    let (record, token) = tokens.issue(user, Some("laptop")).await.unwrap();
    assert_eq!(record.user_id, user);
    assert_eq!(tokens.resolve(&token).await.unwrap(), Some(user));
    assert_eq!(tokens.resolve("not-a-token").await.unwrap(), None);

    let revoked = UserRepository::new(&pool).revoke_tokens(user).await.unwrap();
    assert_eq!(revoked, 1);
    assert_eq!(tokens.resolve(&token).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_revoke_for_missing_user() {
    let pool = pool().await;
    let result = UserRepository::new(&pool).revoke_tokens(UserId::new(i32::MAX)).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}
