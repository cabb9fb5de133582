//! Integration tests for the inventory REST API client.
//!
//! Each test runs its own `FakeInventoryApi` on an ephemeral port.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use secrecy::SecretString;
use url::Url;

use rocketshoes_cart::{FetchError, HttpInventory, InventoryApiConfig, ProductCatalog, StockOracle};
use rocketshoes_core::ProductId;
use rocketshoes_integration_tests::FakeInventoryApi;

fn config(base_url: Url) -> InventoryApiConfig {
    InventoryApiConfig {
        base_url,
        token: None,
        timeout: Duration::from_secs(5),
        product_cache_ttl: Duration::from_secs(300),
    }
}

async fn client(api: &FakeInventoryApi) -> HttpInventory {
    let base_url = api.spawn().await.unwrap();
    HttpInventory::new(&config(base_url)).unwrap()
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_get_product_maps_fields() {
    let api = FakeInventoryApi::new().with_product(1, "Tênis de Caminhada Leve Confortável", 179.9, 3);
    let inventory = client(&api).await;

    let product = inventory.get_product(ProductId::new(1)).await.unwrap();

    assert_eq!(product.id, ProductId::new(1));
    assert_eq!(product.name, "Tênis de Caminhada Leve Confortável");
    assert_eq!(product.price, Decimal::new(1799, 1));
    assert_eq!(product.image_url, "https://cdn.example.test/1.jpg");
}

#[tokio::test]
async fn test_get_product_is_cached() {
    let api = FakeInventoryApi::new().with_product(2, "Tênis VR Caminhada", 139.9, 3);
    let inventory = client(&api).await;

    inventory.get_product(ProductId::new(2)).await.unwrap();
    inventory.get_product(ProductId::new(2)).await.unwrap();
    assert_eq!(api.product_requests(), 1);

    inventory.invalidate_products();
    inventory.get_product(ProductId::new(2)).await.unwrap();
    assert_eq!(api.product_requests(), 2);
}

#[tokio::test]
async fn test_get_missing_product_is_not_found() {
    let api = FakeInventoryApi::new();
    let inventory = client(&api).await;

    let err = inventory.get_product(ProductId::new(99)).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn test_get_product_server_error_is_status() {
    let api = FakeInventoryApi::new().with_product(1, "Tênis", 100.0, 1);
    api.fail_products(StatusCode::INTERNAL_SERVER_ERROR);
    let inventory = client(&api).await;

    let err = inventory.get_product(ProductId::new(1)).await.unwrap_err();
    assert!(
        matches!(err, FetchError::Status { status: 500, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_failed_product_lookup_is_not_cached() {
    let api = FakeInventoryApi::new().with_product(1, "Tênis", 100.0, 1);
    api.fail_products(StatusCode::SERVICE_UNAVAILABLE);
    let inventory = client(&api).await;

    assert!(inventory.get_product(ProductId::new(1)).await.is_err());

    api.recover();
    let product = inventory.get_product(ProductId::new(1)).await.unwrap();
    assert_eq!(product.name, "Tênis");
    assert_eq!(api.product_requests(), 2);
}

// =============================================================================
// Stock
// =============================================================================

#[tokio::test]
async fn test_get_stock_is_never_cached() {
    let api = FakeInventoryApi::new().with_product(3, "Tênis Adidas", 219.9, 5);
    let inventory = client(&api).await;

    let first = inventory.get_stock(ProductId::new(3)).await.unwrap();
    assert_eq!(first.available, 5);

    api.set_stock(3, 1);
    let second = inventory.get_stock(ProductId::new(3)).await.unwrap();
    assert_eq!(second.product_id, ProductId::new(3));
    assert_eq!(second.available, 1);
    assert_eq!(api.stock_requests(), 2);
}

#[tokio::test]
async fn test_negative_stock_reads_as_zero() {
    let api = FakeInventoryApi::new().with_product(4, "Tênis", 99.9, -2);
    let inventory = client(&api).await;

    let stock = inventory.get_stock(ProductId::new(4)).await.unwrap();
    assert_eq!(stock.available, 0);
}

#[tokio::test]
async fn test_missing_stock_is_not_found() {
    let api = FakeInventoryApi::new();
    let inventory = client(&api).await;

    let err = inventory.get_stock(ProductId::new(7)).await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn test_slow_stock_lookup_times_out() {
    let api = FakeInventoryApi::new().with_product(5, "Tênis", 99.9, 2);
    api.delay_stock(Duration::from_secs(3));
    let base_url = api.spawn().await.unwrap();
    let inventory = HttpInventory::new(&InventoryApiConfig {
        timeout: Duration::from_millis(200),
        ..config(base_url)
    })
    .unwrap();

    let err = inventory.get_stock(ProductId::new(5)).await.unwrap_err();
    assert!(matches!(err, FetchError::Http(_)), "got {err:?}");
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_bearer_token_is_sent_when_configured() {
    let api = FakeInventoryApi::new().with_product(6, "Tênis", 99.9, 2);
    let base_url = api.spawn().await.unwrap();
    let inventory = HttpInventory::new(&InventoryApiConfig {
        token: Some(SecretString::from("inv_3c1d5e7f9a2b")),
        ..config(base_url)
    })
    .unwrap();

    inventory.get_stock(ProductId::new(6)).await.unwrap();
    assert_eq!(
        api.last_authorization().as_deref(),
        Some("Bearer inv_3c1d5e7f9a2b")
    );
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let api = FakeInventoryApi::new().with_product(6, "Tênis", 99.9, 2);
    let inventory = client(&api).await;

    inventory.get_stock(ProductId::new(6)).await.unwrap();
    assert_eq!(api.last_authorization(), None);
}
