//! Rocket Shoes CLI - Cart commands and storage migrations.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart
//! rs-cart show
//!
//! # Add one unit of product 5
//! rs-cart add 5
//!
//! # Set product 5 to three units
//! rs-cart set 5 3
//!
//! # Remove product 5
//! rs-cart remove 5
//!
//! # Create the cart_snapshots table
//! rs-cart migrate
//! ```
//!
//! # Commands
//!
//! - `show` - Print the cart and its subtotal
//! - `add`, `remove`, `set` - Mutate the cart against the inventory API
//! - `migrate` - Run `PostgreSQL` storage migrations

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_cart::{CartConfig, LogFormat};
use rocketshoes_core::ProductId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rs-cart")]
#[command(author, version, about = "Rocket Shoes cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart and its subtotal
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Set {
        /// Product ID
        product_id: ProductId,

        /// New amount (zero or negative is ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Run cart storage migrations (`PostgreSQL`)
    Migrate,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Map tracing levels to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &CartConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=info,rocketshoes_cli=info".into());

    let json = config.log_format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Invalid configuration: {e}");
            }
            std::process::exit(2);
        }
    };

    // Must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show => {
            let store = commands::cart::open_store(config).await?;
            commands::cart::show(&store, config);
        }
        Commands::Add { product_id } => {
            let store = commands::cart::open_store(config).await?;
            commands::cart::add(&store, config, product_id).await?;
        }
        Commands::Remove { product_id } => {
            let store = commands::cart::open_store(config).await?;
            commands::cart::remove(&store, config, product_id).await?;
        }
        Commands::Set { product_id, amount } => {
            let store = commands::cart::open_store(config).await?;
            commands::cart::set(&store, config, product_id, amount).await?;
        }
        Commands::Migrate => commands::migrate::run(config).await?,
    }
    Ok(())
}
