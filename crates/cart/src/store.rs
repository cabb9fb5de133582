//! The cart store.
//!
//! [`CartStore`] owns the in-memory cart, writes every committed change
//! through to storage and broadcasts a [`CartEvent`] afterwards. Mutations
//! are serialized: each one holds the mutation lock for its whole
//! read-modify-write, remote lookups included. Readers get an immutable
//! snapshot and never wait on a lookup.
//!
//! # Stock rules
//!
//! - `add_item` on a product already in the cart fails with `OutOfStock` when
//!   the line already holds every available unit.
//! - `add_item` on a new product inserts one unit without comparing against
//!   stock, although the lookup must still succeed.
//! - `set_amount` fails with `OutOfStock` when the requested amount exceeds
//!   what is available, whether or not the product is in the cart.
//!
//! # Example
//!
//! ```rust,ignore
//! let store = CartStore::rehydrate(catalog, stock, storage, StoreOptions::default()).await;
//! let mut events = store.subscribe();
//!
//! store.add_item(ProductId::new(5)).await?;
//! let event = events.recv().await?;
//! assert_eq!(event.change, CartChange::Added(ProductId::new(5)));
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, instrument, warn};

use rocketshoes_core::ProductId;

use crate::cart::{Cart, ProductMetadata, StockLevel};
use crate::config::{CartConfig, DEFAULT_STORAGE_KEY};
use crate::error::{CartError, CartOperation, Lookup, Result};
use crate::inventory::{FetchError, ProductCatalog, StockOracle};
use crate::snapshot;
use crate::storage::{CartStorage, StorageError};

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// What a committed mutation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was inserted with amount 1.
    Added(ProductId),
    /// An existing line's amount went up by one.
    Incremented(ProductId),
    /// A line was removed.
    Removed(ProductId),
    /// A line's amount was set.
    AmountSet(ProductId, u32),
}

impl CartChange {
    /// The product the change applies to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        match self {
            Self::Added(id) | Self::Incremented(id) | Self::Removed(id) | Self::AmountSet(id, _) => {
                *id
            }
        }
    }
}

/// Notification sent after every committed mutation.
#[derive(Debug, Clone)]
pub struct CartEvent {
    /// The change that was committed.
    pub change: CartChange,
    /// The cart as committed.
    pub cart: Arc<Cart>,
}

/// Store construction options.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Namespace key of the persisted snapshot.
    pub storage_key: String,
    /// Capacity of the event channel; slow subscribers lag past this.
    pub event_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl From<&CartConfig> for StoreOptions {
    fn from(config: &CartConfig) -> Self {
        Self {
            storage_key: config.storage.key.clone(),
            event_capacity: config.event_capacity,
        }
    }
}

/// Shopping cart state manager.
///
/// This struct is cheaply cloneable via `Arc`; clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    catalog: Arc<dyn ProductCatalog>,
    stock: Arc<dyn StockOracle>,
    storage: Arc<dyn CartStorage>,
    storage_key: String,
    cart: RwLock<Arc<Cart>>,
    mutation: Mutex<()>,
    events: broadcast::Sender<CartEvent>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("storage_key", &self.inner.storage_key)
            .field("cart", &self.cart())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store from the persisted snapshot.
    ///
    /// Never fails: a missing snapshot, a storage read error or a malformed
    /// snapshot all start the store with an empty cart.
    #[instrument(skip_all, fields(storage_key = %options.storage_key))]
    pub async fn rehydrate(
        catalog: Arc<dyn ProductCatalog>,
        stock: Arc<dyn StockOracle>,
        storage: Arc<dyn CartStorage>,
        options: StoreOptions,
    ) -> Self {
        let cart = match storage.load(&options.storage_key).await {
            Ok(Some(raw)) => snapshot::decode(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding malformed cart snapshot");
                Cart::new()
            }),
            Ok(None) => {
                debug!("No persisted cart, starting empty");
                Cart::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted cart, starting empty");
                Cart::new()
            }
        };

        info!(lines = cart.len(), items = cart.item_count(), "Cart rehydrated");

        let (events, _) = broadcast::channel(options.event_capacity.max(1));

        Self {
            inner: Arc::new(CartStoreInner {
                catalog,
                stock,
                storage,
                storage_key: options.storage_key,
                cart: RwLock::new(Arc::new(cart)),
                mutation: Mutex::new(()),
                events,
            }),
        }
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> Arc<Cart> {
        self.inner.cart.read().clone()
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.events.subscribe()
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// - `FetchFailure` if the product or stock lookup fails
    /// - `OutOfStock` if the line already holds every available unit
    /// - `Storage` if the snapshot cannot be written
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: ProductId) -> Result<()> {
        let operation = CartOperation::AddItem;
        let _guard = self.inner.mutation.lock().await;

        let (product, stock) = tokio::try_join!(
            self.fetch_product(operation, product_id),
            self.fetch_stock(operation, product_id),
        )?;

        let current = self.cart();
        let (next, change) = match current.get(product_id) {
            Some(line) if line.amount >= stock.available => {
                warn!(
                    amount = line.amount,
                    available = stock.available,
                    "Rejected increment beyond available stock"
                );
                return Err(CartError::OutOfStock {
                    operation,
                    product_id,
                    requested: i64::from(line.amount) + 1,
                    available: stock.available,
                });
            }
            Some(_) => (
                current.with_incremented(product_id),
                CartChange::Incremented(product_id),
            ),
            None => (
                Some(current.with_added(&product)),
                CartChange::Added(product_id),
            ),
        };

        match next {
            Some(next) => self.commit(operation, next, change).await,
            None => Ok(()),
        }
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product is not in the cart (including when the
    ///   cart is empty)
    /// - `Storage` if the snapshot cannot be written
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<()> {
        let operation = CartOperation::RemoveItem;
        let _guard = self.inner.mutation.lock().await;

        let Some(next) = self.cart().without(product_id) else {
            warn!("Product not in cart");
            return Err(CartError::NotFound {
                operation,
                product_id,
            });
        };

        self.commit(operation, next, CartChange::Removed(product_id))
            .await
    }

    /// Set the amount of a product already in the cart.
    ///
    /// Amounts of zero or below are ignored without an error or a
    /// notification; use [`CartStore::remove_item`] to delete a line. Setting
    /// the amount of a product that is not in the cart changes nothing.
    ///
    /// # Errors
    ///
    /// - `FetchFailure` if the stock lookup fails
    /// - `OutOfStock` if `amount` exceeds the available stock
    /// - `Storage` if the snapshot cannot be written
    #[instrument(skip_all, fields(product_id = %product_id, amount = amount))]
    pub async fn set_amount(&self, product_id: ProductId, amount: i64) -> Result<()> {
        let operation = CartOperation::SetAmount;
        if amount <= 0 {
            debug!(amount, "Ignoring non-positive amount");
            return Ok(());
        }

        let _guard = self.inner.mutation.lock().await;
        let stock = self.fetch_stock(operation, product_id).await?;

        let out_of_stock = || CartError::OutOfStock {
            operation,
            product_id,
            requested: amount,
            available: stock.available,
        };
        if amount > i64::from(stock.available) {
            warn!(
                amount,
                available = stock.available,
                "Rejected amount beyond available stock"
            );
            return Err(out_of_stock());
        }
        let amount = u32::try_from(amount).map_err(|_| out_of_stock())?;

        let Some(next) = self.cart().with_amount(product_id, amount) else {
            debug!("Product not in cart, nothing to update");
            return Ok(());
        };

        self.commit(operation, next, CartChange::AmountSet(product_id, amount))
            .await
    }

    async fn fetch_product(
        &self,
        operation: CartOperation,
        product_id: ProductId,
    ) -> Result<ProductMetadata> {
        self.inner
            .catalog
            .get_product(product_id)
            .await
            .and_then(|product| expect_id(product_id, product.id).map(|()| product))
            .map_err(|source| {
                warn!(error = %source, "Product lookup failed");
                CartError::FetchFailure {
                    operation,
                    lookup: Lookup::Product,
                    product_id,
                    source,
                }
            })
    }

    async fn fetch_stock(&self, operation: CartOperation, product_id: ProductId) -> Result<StockLevel> {
        self.inner
            .stock
            .get_stock(product_id)
            .await
            .and_then(|stock| expect_id(product_id, stock.product_id).map(|()| stock))
            .map_err(|source| {
                warn!(error = %source, "Stock lookup failed");
                CartError::FetchFailure {
                    operation,
                    lookup: Lookup::Stock,
                    product_id,
                    source,
                }
            })
    }

    /// Persist `next`, then publish it in memory and notify subscribers.
    ///
    /// Must be called with the mutation lock held. If the write fails the
    /// in-memory cart is left as it was.
    async fn commit(&self, operation: CartOperation, next: Cart, change: CartChange) -> Result<()> {
        let storage_error = |source: StorageError| {
            warn!(error = %source, "Failed to persist cart");
            CartError::Storage { operation, source }
        };

        let raw = snapshot::encode(&next).map_err(|e| storage_error(e.into()))?;
        self.inner
            .storage
            .save(&self.inner.storage_key, &raw)
            .await
            .map_err(storage_error)?;

        let next = Arc::new(next);
        *self.inner.cart.write() = Arc::clone(&next);

        info!(
            product_id = %change.product_id(),
            change = ?change,
            lines = next.len(),
            items = next.item_count(),
            "Cart updated"
        );

        // No receivers is fine
        let _ = self.inner.events.send(CartEvent { change, cart: next });
        Ok(())
    }
}

/// A lookup answered for another product is treated as failed.
fn expect_id(requested: ProductId, returned: ProductId) -> std::result::Result<(), FetchError> {
    if requested == returned {
        Ok(())
    } else {
        Err(FetchError::Mismatch {
            requested,
            returned,
        })
    }
}
