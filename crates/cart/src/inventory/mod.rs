//! Remote collaborators consulted by the cart store.
//!
//! - [`ProductCatalog`] resolves product metadata when a product is first added.
//! - [`StockOracle`] reports how many units are available right now.
//!
//! Two implementations ship with the crate: [`HttpInventory`] talks to the
//! inventory REST API, [`InMemoryInventory`] serves fixed maps for tests and
//! demos. Stock is never cached by either.

mod http;
mod memory;

pub use http::HttpInventory;
pub use memory::InMemoryInventory;

use async_trait::async_trait;
use thiserror::Error;

use rocketshoes_core::ProductId;

use crate::cart::{ProductMetadata, StockLevel};

/// Errors that can occur when looking up products or stock.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The source answered for a different product than the one requested.
    #[error("requested product {requested}, got product {returned}")]
    Mismatch {
        requested: ProductId,
        returned: ProductId,
    },

    /// The source could not serve the request.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Resolves product metadata by ID.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch metadata for a product.
    async fn get_product(&self, product_id: ProductId) -> Result<ProductMetadata, FetchError>;
}

/// Reports currently available stock by product ID.
#[async_trait]
pub trait StockOracle: Send + Sync {
    /// Fetch the current stock level for a product.
    async fn get_stock(&self, product_id: ProductId) -> Result<StockLevel, FetchError>;
}
