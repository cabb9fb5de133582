//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_API_BASE_URL` - Inventory API base URL (default: `http://localhost:3333`)
//! - `CART_API_TOKEN` - Bearer token for the inventory API
//! - `CART_API_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `CART_PRODUCT_CACHE_TTL_SECS` - Product metadata cache TTL (default: 300)
//! - `CART_STORAGE` - `file`, `memory` or `postgres` (default: `file`)
//! - `CART_STORAGE_DIR` - Snapshot directory for `file` storage (default: `.rocketshoes`)
//! - `CART_STORAGE_KEY` - Namespace key for the snapshot (default: `@RocketShoes:cart`)
//! - `CART_DATABASE_URL` - `PostgreSQL` connection string, falls back to `DATABASE_URL`
//!   (required for `postgres` storage)
//! - `CART_EVENT_CAPACITY` - Change notification buffer size (default: 64)
//! - `CART_CURRENCY` - ISO 4217 code used to display prices (default: `USD`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `LOG_FORMAT` - `pretty` or `json` (default: `pretty`)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use rocketshoes_core::CurrencyCode;

/// Default namespace key for the persisted cart.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

const DEFAULT_API_BASE_URL: &str = "http://localhost:3333";
const DEFAULT_STORAGE_DIR: &str = ".rocketshoes";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where cart snapshots are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Inventory API configuration
    pub api: InventoryApiConfig,
    /// Snapshot storage configuration
    pub storage: StorageConfig,
    /// Capacity of the change notification channel
    pub event_capacity: usize,
    /// Currency used to display prices
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Inventory API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct InventoryApiConfig {
    /// Base URL, e.g. `http://localhost:3333`
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Request timeout
    pub timeout: Duration,
    /// How long product metadata stays cached
    pub product_cache_ttl: Duration,
}

impl std::fmt::Debug for InventoryApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("product_cache_ttl", &self.product_cache_ttl)
            .finish()
    }
}

impl Default for InventoryApiConfig {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is valid"),
            token: None,
            timeout: Duration::from_secs(10),
            product_cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Snapshot storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Selected backend
    pub backend: StorageBackend,
    /// Directory for `file` storage
    pub dir: PathBuf,
    /// Namespace key of the snapshot
    pub key: String,
    /// Connection string for `postgres` storage
    pub database_url: Option<SecretString>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            key: DEFAULT_STORAGE_KEY.to_string(),
            database_url: None,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, the token looks like a
    /// placeholder, or `postgres` storage is selected without a database URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`CartConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let base_url = env.parse_or("CART_API_BASE_URL", DEFAULT_API_BASE_URL, |raw| {
            let url = Url::parse(raw).map_err(|e| e.to_string())?;
            if matches!(url.scheme(), "http" | "https") {
                Ok(url)
            } else {
                Err(format!("unsupported scheme '{}'", url.scheme()))
            }
        })?;
        let token = env
            .optional("CART_API_TOKEN")
            .map(|value| {
                validate_secret_strength(&value, "CART_API_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(value))
            })
            .transpose()?;
        let timeout = Duration::from_secs(env.parse_or("CART_API_TIMEOUT_SECS", "10", positive)?);
        let product_cache_ttl = Duration::from_secs(env.parse_or(
            "CART_PRODUCT_CACHE_TTL_SECS",
            "300",
            |raw| raw.parse::<u64>().map_err(|e| e.to_string()),
        )?);

        let backend = env.parse_or("CART_STORAGE", "file", StorageBackend::from_str)?;
        let database_url = env
            .optional("CART_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from);
        if backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("CART_DATABASE_URL".to_string()));
        }
        let storage = StorageConfig {
            backend,
            dir: PathBuf::from(env.or_default("CART_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            key: env.or_default("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY),
            database_url,
        };
        if storage.key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let event_capacity = env.parse_or("CART_EVENT_CAPACITY", "64", |raw| {
            positive(raw).and_then(|n| usize::try_from(n).map_err(|e| e.to_string()))
        })?;
        let currency = env.parse_or("CART_CURRENCY", "USD", parse_currency)?;
        let log_format = env.parse_or("LOG_FORMAT", "pretty", LogFormat::from_str)?;

        Ok(Self {
            api: InventoryApiConfig {
                base_url,
                token,
                timeout,
                product_cache_ttl,
            },
            storage,
            event_capacity,
            currency,
            sentry_dsn: env.optional("SENTRY_DSN"),
            log_format,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(
        &self,
        key: &str,
        default: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<T, ConfigError> {
        let raw = self.or_default(key, default);
        parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
    }
}

fn positive(raw: &str) -> Result<u64, String> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err("must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_currency(raw: &str) -> Result<CurrencyCode, String> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "USD" => Ok(CurrencyCode::USD),
        "EUR" => Ok(CurrencyCode::EUR),
        "GBP" => Ok(CurrencyCode::GBP),
        "CAD" => Ok(CurrencyCode::CAD),
        "AUD" => Ok(CurrencyCode::AUD),
        "BRL" => Ok(CurrencyCode::BRL),
        other => Err(format!("unsupported currency '{other}'")),
    }
}

/// Validate that a secret is not a placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}
