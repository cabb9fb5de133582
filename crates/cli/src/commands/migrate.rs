//! Storage migration command.
//!
//! # Usage
//!
//! ```bash
//! CART_DATABASE_URL=postgres://localhost/rocketshoes rs-cart migrate
//! ```
//!
//! Migrations live in `crates/cart/migrations/`.

use rocketshoes_cart::CartConfig;

/// Apply pending `cart_snapshots` migrations.
#[cfg(feature = "postgres")]
pub async fn run(config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    use rocketshoes_cart::storage::PgStorage;

    let database_url = config
        .storage
        .database_url
        .as_ref()
        .ok_or("CART_DATABASE_URL (or DATABASE_URL) must be set to run migrations")?;

    tracing::info!("Connecting to cart database...");
    let storage = PgStorage::connect(database_url).await?;
    storage.migrate().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Cart storage migrations complete");
    }
    Ok(())
}

/// Apply pending `cart_snapshots` migrations.
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn run(_config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    Err("rs-cart was built without the `postgres` feature".into())
}
