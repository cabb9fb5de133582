//! Integration tests for the Rocket Shoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP and file-storage tests (no external services)
//! cargo test -p rocketshoes-integration-tests
//!
//! # Include PostgreSQL storage tests
//! CART_TEST_DATABASE_URL=postgres://localhost/rocketshoes_test \
//!     cargo test -p rocketshoes-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `inventory_http` - `HttpInventory` against a fake inventory API
//! - `cart_flow` - `CartStore` end to end with HTTP lookups and file storage
//! - `postgres_storage` - `PgStorage` against a real database
//!
//! [`FakeInventoryApi`] serves `/products/{id}` and `/stock/{id}` from
//! in-memory maps on an ephemeral port.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use parking_lot::RwLock;
use serde_json::json;
use url::Url;

/// In-process stand-in for the inventory REST API.
///
/// Cloneable; clones share state, so tests can change stock while the
/// server is running.
#[derive(Clone, Default)]
pub struct FakeInventoryApi {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    products: RwLock<HashMap<i64, serde_json::Value>>,
    stock: RwLock<HashMap<i64, i64>>,
    product_failure: RwLock<Option<StatusCode>>,
    stock_failure: RwLock<Option<StatusCode>>,
    stock_delay: RwLock<Option<Duration>>,
    last_authorization: RwLock<Option<String>>,
    product_requests: AtomicUsize,
    stock_requests: AtomicUsize,
}

impl FakeInventoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product with a price (as a JSON number) and a stock amount.
    #[must_use]
    pub fn with_product(self, id: i64, title: &str, price: f64, amount: i64) -> Self {
        self.inner.products.write().insert(
            id,
            json!({
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://cdn.example.test/{id}.jpg"),
            }),
        );
        self.set_stock(id, amount);
        self
    }

    pub fn set_stock(&self, id: i64, amount: i64) {
        self.inner.stock.write().insert(id, amount);
    }

    /// Answer every `/products` request with `status`.
    pub fn fail_products(&self, status: StatusCode) {
        *self.inner.product_failure.write() = Some(status);
    }

    /// Answer every `/stock` request with `status`.
    pub fn fail_stock(&self, status: StatusCode) {
        *self.inner.stock_failure.write() = Some(status);
    }

    /// Hold every `/stock` response for `delay`.
    pub fn delay_stock(&self, delay: Duration) {
        *self.inner.stock_delay.write() = Some(delay);
    }

    /// Reset injected failures and delays.
    pub fn recover(&self) {
        *self.inner.product_failure.write() = None;
        *self.inner.stock_failure.write() = None;
        *self.inner.stock_delay.write() = None;
    }

    #[must_use]
    pub fn product_requests(&self) -> usize {
        self.inner.product_requests.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stock_requests(&self) -> usize {
        self.inner.stock_requests.load(Ordering::SeqCst)
    }

    /// `Authorization` header of the most recent request.
    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        self.inner.last_authorization.read().clone()
    }

    /// Bind to an ephemeral port and serve in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn(&self) -> std::io::Result<Url> {
        let app = Router::new()
            .route("/products/{id}", get(product))
            .route("/stock/{id}", get(stock))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Url::parse(&format!("http://{addr}"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    }

    fn record_authorization(&self, headers: &HeaderMap) {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *self.inner.last_authorization.write() = value;
    }
}

async fn product(
    State(api): State<FakeInventoryApi>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    api.inner.product_requests.fetch_add(1, Ordering::SeqCst);
    api.record_authorization(&headers);

    if let Some(status) = *api.inner.product_failure.read() {
        return (status, "injected failure").into_response();
    }

    let body = api.inner.products.read().get(&id).cloned();
    body.map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |body| Json(body).into_response(),
    )
}

async fn stock(
    State(api): State<FakeInventoryApi>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    api.inner.stock_requests.fetch_add(1, Ordering::SeqCst);
    api.record_authorization(&headers);

    let delay = *api.inner.stock_delay.read();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(status) = *api.inner.stock_failure.read() {
        return (status, "injected failure").into_response();
    }

    let amount = api.inner.stock.read().get(&id).copied();
    amount.map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |amount| Json(json!({ "id": id, "amount": amount })).into_response(),
    )
}
