//! Inventory REST API client.
//!
//! Uses `reqwest` for HTTP. Product metadata is cached with `moka`; stock
//! levels are always fetched fresh.
//!
//! # Endpoints
//!
//! - `GET {base}/products/{id}` → `{ "id", "title", "price", "image" }`
//! - `GET {base}/stock/{id}` → `{ "id", "amount" }`

mod conversions;

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use rocketshoes_core::ProductId;

use super::{FetchError, ProductCatalog, StockOracle};
use crate::cart::{ProductMetadata, StockLevel};
use crate::config::InventoryApiConfig;

use conversions::{ProductResponse, StockResponse, convert_product, convert_stock};

const MAX_CACHED_PRODUCTS: u64 = 1000;

/// Client for the inventory REST API.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the product
/// cache.
#[derive(Clone)]
pub struct HttpInventory {
    inner: Arc<HttpInventoryInner>,
}

struct HttpInventoryInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    products: Cache<ProductId, ProductMetadata>,
}

impl std::fmt::Debug for HttpInventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpInventory")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.inner.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl HttpInventory {
    /// Create a new inventory API client.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be built.
    pub fn new(config: &InventoryApiConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let products = Cache::builder()
            .max_capacity(MAX_CACHED_PRODUCTS)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(HttpInventoryInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                products,
            }),
        })
    }

    /// Build `{base}/{resource}/{id}`, keeping any path prefix on the base URL.
    fn endpoint(&self, resource: &str, product_id: ProductId) -> Result<Url, FetchError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                FetchError::Unavailable(format!(
                    "base URL cannot carry a path: {}",
                    self.inner.base_url
                ))
            })?
            .pop_if_empty()
            .push(resource)
            .push(&product_id.to_string());
        Ok(url)
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let mut request = self.inner.client.get(url.clone());
        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                url = %url,
                body = %body.chars().take(200).collect::<String>(),
                "Inventory API returned non-success status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(
                error = %e,
                url = %url,
                body = %body.chars().take(200).collect::<String>(),
                "Failed to parse inventory API response"
            );
            FetchError::Parse(e)
        })
    }

    /// Drop all cached product metadata.
    pub fn invalidate_products(&self) {
        self.inner.products.invalidate_all();
    }
}

#[async_trait]
impl ProductCatalog for HttpInventory {
    #[instrument(skip_all, fields(product_id = %product_id))]
    async fn get_product(&self, product_id: ProductId) -> Result<ProductMetadata, FetchError> {
        if let Some(product) = self.inner.products.get(&product_id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = self.endpoint("products", product_id)?;
        let response: ProductResponse = self.get_json(url).await?;
        let product = convert_product(response);

        self.inner
            .products
            .insert(product_id, product.clone())
            .await;

        Ok(product)
    }
}

#[async_trait]
impl StockOracle for HttpInventory {
    #[instrument(skip_all, fields(product_id = %product_id))]
    async fn get_stock(&self, product_id: ProductId) -> Result<StockLevel, FetchError> {
        let url = self.endpoint("stock", product_id)?;
        let response: StockResponse = self.get_json(url).await?;
        let stock = convert_stock(&response);
        debug!(available = stock.available, "Fetched stock level");
        Ok(stock)
    }
}
