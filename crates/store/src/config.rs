//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional, with defaults matching the shipped behavior:
//! - `CART_STORAGE_KEY` - Durable slot name (default: `regional_cart_data`)
//! - `CART_DEBOUNCE_MS` - Quantity debounce window in ms (default: 300)
//! - `CART_RETENTION_DAYS` - Prune threshold on quota failure (default: 7)

use std::time::Duration;

use crate::error::ConfigError;

/// Default durable slot name.
pub const DEFAULT_STORAGE_KEY: &str = "regional_cart_data";

/// Default trailing-edge delay for debounced quantity edits.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default retention window for quota-failure pruning, in days.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Cart engine configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name of the single durable key-value slot holding the cart blob.
    /// Consumed by the embedder when constructing its storage slot.
    pub storage_key: String,
    /// Trailing-edge delay applied to debounced increase/decrease edits.
    pub debounce: Duration,
    /// Items older than this many days are pruned when a durable write
    /// fails on quota.
    pub retention_days: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            debounce: DEFAULT_DEBOUNCE,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage_key = get_env_or_default("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);

        let debounce_ms = get_env_or_default("CART_DEBOUNCE_MS", "300")
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_DEBOUNCE_MS".to_owned(), e.to_string()))?;

        let retention_days = get_env_or_default("CART_RETENTION_DAYS", "7")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CART_RETENTION_DAYS".to_owned(), e.to_string())
            })?;

        Ok(Self {
            storage_key,
            debounce: Duration::from_millis(debounce_ms),
            retention_days,
        })
    }

    /// The retention window as a `chrono::Duration`.
    #[must_use]
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
