//! Cart store errors.
//!
//! Every failed mutation leaves the in-memory cart and the persisted snapshot
//! untouched. `Display` is meant for logs; [`CartError::user_message`] is the
//! text a presentation layer shows the shopper.

use core::fmt;

use thiserror::Error;

use rocketshoes_core::ProductId;

use crate::inventory::FetchError;
use crate::storage::StorageError;

const OUT_OF_STOCK_MESSAGE: &str = "Requested quantity is out of stock";

/// The mutation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    AddItem,
    RemoveItem,
    SetAmount,
}

impl CartOperation {
    /// Generic shopper-facing message for a failure of this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::AddItem => "Error adding product",
            Self::RemoveItem => "Error removing product",
            Self::SetAmount => "Error updating product amount",
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AddItem => "add item",
            Self::RemoveItem => "remove item",
            Self::SetAmount => "set amount",
        })
    }
}

/// Which remote lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Product,
    Stock,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Product => "product",
            Self::Stock => "stock",
        })
    }
}

/// Errors returned by cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// A catalog or stock lookup failed or returned no data.
    #[error("{operation} failed: could not fetch {lookup} for product {product_id}: {source}")]
    FetchFailure {
        operation: CartOperation,
        lookup: Lookup,
        product_id: ProductId,
        #[source]
        source: FetchError,
    },

    /// The requested amount exceeds the available stock.
    #[error(
        "{operation} failed: requested {requested} of product {product_id}, only {available} available"
    )]
    OutOfStock {
        operation: CartOperation,
        product_id: ProductId,
        requested: i64,
        available: u32,
    },

    /// The product is not in the cart.
    #[error("{operation} failed: product {product_id} is not in the cart")]
    NotFound {
        operation: CartOperation,
        product_id: ProductId,
    },

    /// Writing the snapshot failed; the cart was not changed.
    #[error("{operation} failed: could not persist cart: {source}")]
    Storage {
        operation: CartOperation,
        #[source]
        source: StorageError,
    },
}

impl CartError {
    /// The operation that failed.
    #[must_use]
    pub const fn operation(&self) -> CartOperation {
        match self {
            Self::FetchFailure { operation, .. }
            | Self::OutOfStock { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::Storage { operation, .. } => *operation,
        }
    }

    /// Human-readable message for display to the shopper.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::OutOfStock { .. } => OUT_OF_STOCK_MESSAGE,
            _ => self.operation().failure_message(),
        }
    }

    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        matches!(self, Self::OutOfStock { .. })
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
