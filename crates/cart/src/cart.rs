//! Cart domain types.
//!
//! A [`Cart`] is an ordered sequence of [`CartLineItem`]s with at most one line
//! per product and every amount at least 1. Both invariants are checked when a
//! cart is built from untrusted input (see [`Cart::from_items`]), so a `Cart`
//! value in memory is always well-formed.
//!
//! The `with_*`/`without` methods are pure state transitions: they return a
//! new cart and leave `self` untouched, which is what lets the store keep the
//! previous state intact when a commit fails.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rocketshoes_core::{CurrencyCode, Price, ProductId};

/// Product metadata resolved from the catalog on first insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Decimal,
    /// Product image URL.
    pub image_url: String,
}

/// Current stock for a product, fetched fresh for every mutation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    /// Product ID.
    pub product_id: ProductId,
    /// Units currently available for purchase.
    pub available: u32,
}

/// A single product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Product ID (unique within a cart).
    pub product_id: ProductId,
    /// Display name captured when the product was added.
    pub name: String,
    /// Unit price captured when the product was added.
    pub price: Decimal,
    /// Product image URL.
    pub image_url: String,
    /// Quantity, always >= 1.
    pub amount: u32,
}

impl CartLineItem {
    /// Build a new line with amount 1 from catalog metadata.
    #[must_use]
    pub fn first_unit(product: &ProductMetadata) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            amount: 1,
        }
    }

    /// Unit price × amount, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.amount))
    }
}

/// Violations of the cart invariants found in untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartInvariantError {
    /// A line item has amount 0.
    #[error("line for product {0} has amount 0")]
    ZeroAmount(ProductId),
    /// The same product appears in more than one line.
    #[error("product {0} appears in more than one line")]
    DuplicateProduct(ProductId),
}

/// The shopper's current selection of products and quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    #[serde(deserialize_with = "deserialize_items")]
    items: Vec<CartLineItem>,
}

fn deserialize_items<'de, D>(deserializer: D) -> Result<Vec<CartLineItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let items = Vec::<CartLineItem>::deserialize(deserializer)?;
    Cart::validate(&items).map_err(serde::de::Error::custom)?;
    Ok(items)
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from line items, checking the cart invariants.
    ///
    /// # Errors
    ///
    /// Returns `CartInvariantError` if any amount is 0 or a product appears
    /// more than once.
    pub fn from_items(items: Vec<CartLineItem>) -> Result<Self, CartInvariantError> {
        Self::validate(&items)?;
        Ok(Self { items })
    }

    fn validate(items: &[CartLineItem]) -> Result<(), CartInvariantError> {
        for (index, item) in items.iter().enumerate() {
            if item.amount == 0 {
                return Err(CartInvariantError::ZeroAmount(item.product_id));
            }
            if items
                .iter()
                .skip(index + 1)
                .any(|other| other.product_id == item.product_id)
            {
                return Err(CartInvariantError::DuplicateProduct(item.product_id));
            }
        }
        Ok(())
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Whether the cart has a line for this product.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of price × amount over all lines, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(CartLineItem::total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Subtotal as a displayable price.
    #[must_use]
    pub fn subtotal_in(&self, currency: CurrencyCode) -> Price {
        Price::new(self.subtotal(), currency)
    }

    /// Price × amount for a single line.
    #[must_use]
    pub fn line_total(&self, product_id: ProductId) -> Option<Decimal> {
        self.get(product_id).map(CartLineItem::total)
    }

    /// Append a new line with amount 1.
    ///
    /// Returns an unchanged copy if the product is already present.
    #[must_use]
    pub fn with_added(&self, product: &ProductMetadata) -> Self {
        let mut next = self.clone();
        if !next.contains(product.id) {
            next.items.push(CartLineItem::first_unit(product));
        }
        next
    }

    /// Increment the amount of an existing line by one.
    ///
    /// Returns `None` if the product is not in the cart.
    #[must_use]
    pub fn with_incremented(&self, product_id: ProductId) -> Option<Self> {
        let mut next = self.clone();
        let line = next
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)?;
        line.amount = line.amount.saturating_add(1);
        Some(next)
    }

    /// Set the amount of an existing line.
    ///
    /// Returns `None` if the product is not in the cart or `amount` is 0.
    #[must_use]
    pub fn with_amount(&self, product_id: ProductId, amount: u32) -> Option<Self> {
        if amount == 0 {
            return None;
        }
        let mut next = self.clone();
        let line = next
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)?;
        line.amount = amount;
        Some(next)
    }

    /// Remove the line for a product.
    ///
    /// Returns `None` if the product is not in the cart.
    #[must_use]
    pub fn without(&self, product_id: ProductId) -> Option<Self> {
        if !self.contains(product_id) {
            return None;
        }
        Some(Self {
            items: self
                .items
                .iter()
                .filter(|item| item.product_id != product_id)
                .cloned()
                .collect(),
        })
    }
}
