//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Finance ledger behavior.
    #[serde(default)]
    pub finance: FinanceConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a new connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    8
}

/// Finance ledger configuration.
///
/// The defaults are the values filled into rows whose backing table left
/// the field empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FinanceConfig {
    /// Query the three backing tables concurrently.
    #[serde(default = "default_concurrent_reads")]
    pub concurrent_reads: bool,
    /// Payment method used when a row has none.
    #[serde(default = "default_payment_method")]
    pub default_payment_method: String,
    /// Category used when a row has none.
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Status used for income rows that have none.
    #[serde(default = "default_income_status")]
    pub default_income_status: String,
}

fn default_concurrent_reads() -> bool {
    true
}

fn default_payment_method() -> String {
    "unknown".to_string()
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

fn default_income_status() -> String {
    "completed".to_string()
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            concurrent_reads: default_concurrent_reads(),
            default_payment_method: default_payment_method(),
            default_category: default_category(),
            default_income_status: default_income_status(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("GYMLEDGER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
