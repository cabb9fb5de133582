//! Cart commands.
//!
//! Each invocation rehydrates the cart from the configured storage, applies
//! at most one mutation, and prints the resulting cart.
//!
//! # Environment Variables
//!
//! - `CART_API_BASE_URL` - Inventory API base URL
//! - `CART_STORAGE` - `file`, `memory`, or `postgres`
//! - `CART_STORAGE_DIR` / `CART_STORAGE_KEY` - Snapshot location

use std::sync::Arc;

use rocketshoes_cart::{Cart, CartConfig, CartError, CartStore, HttpInventory, StoreOptions, storage};
use rocketshoes_core::{Price, ProductId};

/// Build a store backed by the HTTP inventory and the configured storage.
pub async fn open_store(config: &CartConfig) -> Result<CartStore, Box<dyn std::error::Error>> {
    let inventory = Arc::new(HttpInventory::new(&config.api)?);
    let storage = storage::open(&config.storage).await?;

    tracing::debug!(
        backend = ?config.storage.backend,
        key = %config.storage.key,
        "Opening cart"
    );

    Ok(CartStore::rehydrate(inventory.clone(), inventory, storage, StoreOptions::from(config)).await)
}

/// Print the current cart.
pub fn show(store: &CartStore, config: &CartConfig) {
    print_cart(&store.cart(), config);
}

/// Add one unit of a product.
pub async fn add(
    store: &CartStore,
    config: &CartConfig,
    product_id: ProductId,
) -> Result<(), CartError> {
    report(store.add_item(product_id).await)?;
    print_cart(&store.cart(), config);
    Ok(())
}

/// Remove a product line.
pub async fn remove(
    store: &CartStore,
    config: &CartConfig,
    product_id: ProductId,
) -> Result<(), CartError> {
    report(store.remove_item(product_id).await)?;
    print_cart(&store.cart(), config);
    Ok(())
}

/// Set the amount of a product line.
pub async fn set(
    store: &CartStore,
    config: &CartConfig,
    product_id: ProductId,
    amount: i64,
) -> Result<(), CartError> {
    if amount <= 0 {
        tracing::info!(amount, "Ignoring non-positive amount");
    }
    report(store.set_amount(product_id, amount).await)?;
    print_cart(&store.cart(), config);
    Ok(())
}

/// Show the shopper-facing message for a failed mutation.
fn report(result: Result<(), CartError>) -> Result<(), CartError> {
    if let Err(e) = &result {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("{}", e.user_message());
        }
    }
    result
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart, config: &CartConfig) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    println!("{:>6}  {:<40}  {:>10}  {:>6}  {:>12}", "ID", "PRODUCT", "PRICE", "QTY", "TOTAL");
    for item in cart.items() {
        let unit = Price::new(item.price, config.currency);
        println!(
            "{:>6}  {:<40}  {:>10}  {:>6}  {:>12}",
            item.product_id,
            item.name,
            unit.to_string(),
            item.amount,
            unit.times(item.amount).to_string(),
        );
    }
    println!();
    println!(
        "{} item(s), subtotal {} {}",
        cart.item_count(),
        cart.subtotal_in(config.currency),
        config.currency.code()
    );
}
