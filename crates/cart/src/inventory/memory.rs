//! In-memory inventory backed by fixed maps.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use rocketshoes_core::ProductId;

use super::{FetchError, ProductCatalog, StockOracle};
use crate::cart::{ProductMetadata, StockLevel};

/// Product catalog and stock oracle served from memory.
///
/// Unknown products and products without a stock entry fail with
/// `FetchError::NotFound`, the same way the HTTP API answers a 404.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    products: RwLock<HashMap<ProductId, ProductMetadata>>,
    stock: RwLock<HashMap<ProductId, u32>>,
    product_lookups: AtomicUsize,
    stock_lookups: AtomicUsize,
}

impl InMemoryInventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product with its available stock.
    #[must_use]
    pub fn with_product(self, product: ProductMetadata, available: u32) -> Self {
        self.set_stock(product.id, available);
        self.products.write().insert(product.id, product);
        self
    }

    /// Set the available stock for a product.
    pub fn set_stock(&self, product_id: ProductId, available: u32) {
        self.stock.write().insert(product_id, available);
    }

    /// Drop the stock entry so lookups fail.
    pub fn clear_stock(&self, product_id: ProductId) {
        self.stock.write().remove(&product_id);
    }

    /// Number of catalog lookups served so far.
    #[must_use]
    pub fn product_lookups(&self) -> usize {
        self.product_lookups.load(Ordering::Relaxed)
    }

    /// Number of stock lookups served so far.
    #[must_use]
    pub fn stock_lookups(&self) -> usize {
        self.stock_lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ProductCatalog for InMemoryInventory {
    async fn get_product(&self, product_id: ProductId) -> Result<ProductMetadata, FetchError> {
        self.product_lookups.fetch_add(1, Ordering::Relaxed);
        self.products
            .read()
            .get(&product_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("product {product_id}")))
    }
}

#[async_trait]
impl StockOracle for InMemoryInventory {
    async fn get_stock(&self, product_id: ProductId) -> Result<StockLevel, FetchError> {
        self.stock_lookups.fetch_add(1, Ordering::Relaxed);
        self.stock
            .read()
            .get(&product_id)
            .map(|&available| StockLevel {
                product_id,
                available,
            })
            .ok_or_else(|| FetchError::NotFound(format!("stock for product {product_id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::tests::product;

    #[tokio::test]
    async fn test_lookups_and_counters() {
        let inventory = InMemoryInventory::new().with_product(product(1, "Runner", 100), 4);

        let found = inventory.get_product(ProductId::new(1)).await.unwrap();
        assert_eq!(found.name, "Runner");
        let stock = inventory.get_stock(ProductId::new(1)).await.unwrap();
        assert_eq!(stock.available, 4);

        assert!(matches!(
            inventory.get_product(ProductId::new(2)).await,
            Err(FetchError::NotFound(_))
        ));

        inventory.clear_stock(ProductId::new(1));
        assert!(inventory.get_stock(ProductId::new(1)).await.is_err());

        assert_eq!(inventory.product_lookups(), 2);
        assert_eq!(inventory.stock_lookups(), 2);
    }
}
