//! Rocket Shoes Cart - Shopping cart state manager.
//!
//! Tracks which products a shopper has selected and in what quantity,
//! validates quantity changes against remotely sourced stock, and keeps a
//! durable snapshot of the cart in step with memory after every change.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the cart and serializes mutations
//! - [`ProductCatalog`] / [`StockOracle`] are the remote lookups it consults
//! - [`CartStorage`] adapters hold the serialized snapshot
//! - Subscribers receive a [`CartEvent`] after every committed change
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use rocketshoes_cart::{CartConfig, CartStore, HttpInventory, StoreOptions, storage};
//! use rocketshoes_core::ProductId;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CartConfig::from_env()?;
//! let inventory = Arc::new(HttpInventory::new(&config.api)?);
//! let storage = storage::open(&config.storage).await?;
//!
//! let store = CartStore::rehydrate(
//!     inventory.clone(),
//!     inventory,
//!     storage,
//!     StoreOptions::from(&config),
//! )
//! .await;
//!
//! if let Err(e) = store.add_item(ProductId::new(5)).await {
//!     eprintln!("{}", e.user_message());
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod inventory;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use cart::{Cart, CartInvariantError, CartLineItem, ProductMetadata, StockLevel};
pub use config::{CartConfig, ConfigError, InventoryApiConfig, LogFormat, StorageBackend, StorageConfig};
pub use error::{CartError, CartOperation, Lookup};
pub use inventory::{FetchError, HttpInventory, InMemoryInventory, ProductCatalog, StockOracle};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{CartChange, CartEvent, CartStore, StoreOptions};
