//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::enrichment::{CoinGeckoConfig, EtherscanConfig, MAX_DECIMALS};
use crate::storage::{IdentifierKind, Namespace};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub balance: BalanceConfig,

    #[serde(default)]
    pub lists: ListsConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Local persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("singularity").to_string_lossy().to_string())
        .unwrap_or_else(|| "./singularity_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Which market data source enriches coin lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketProvider {
    Coingecko,
    Demo,
}

impl std::str::FromStr for MarketProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coingecko" => Ok(MarketProvider::Coingecko),
            "demo" => Ok(MarketProvider::Demo),
            other => Err(format!("unknown market provider: {}", other)),
        }
    }
}

/// Market data configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_market_provider")]
    pub provider: MarketProvider,

    #[serde(default = "default_market_url")]
    pub base_url: String,

    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_market_provider() -> MarketProvider {
    MarketProvider::Coingecko
}

fn default_market_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            provider: default_market_provider(),
            base_url: default_market_url(),
            vs_currency: default_vs_currency(),
            api_key: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl MarketConfig {
    pub fn client_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url: self.base_url.clone(),
            vs_currency: self.vs_currency.clone(),
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

/// Wallet balance configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceConfig {
    #[serde(default = "default_balance_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_decimals")]
    pub decimals: u32,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_balance_url() -> String {
    "https://api.etherscan.io/api".to_string()
}

fn default_decimals() -> u32 {
    18
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            base_url: default_balance_url(),
            api_key: String::new(),
            decimals: default_decimals(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl BalanceConfig {
    pub fn client_config(&self) -> EtherscanConfig {
        EtherscanConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            decimals: self.decimals,
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

/// Default contents of each list, used while nothing is stored
#[derive(Debug, Clone, Deserialize)]
pub struct ListsConfig {
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,

    #[serde(default)]
    pub portfolio: Vec<String>,

    #[serde(default)]
    pub wallets: Vec<String>,
}

fn default_watchlist() -> Vec<String> {
    vec![
        "bitcoin".to_string(),
        "ethereum".to_string(),
        "solana".to_string(),
    ]
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            watchlist: default_watchlist(),
            portfolio: Vec::new(),
            wallets: Vec::new(),
        }
    }
}

impl ListsConfig {
    /// The three built-in namespaces with configured seeds
    pub fn namespaces(&self) -> [Namespace; 3] {
        [
            Namespace::new("watchlist", IdentifierKind::CoinId).with_seed(&self.watchlist),
            Namespace::new("portfolio", IdentifierKind::CoinId).with_seed(&self.portfolio),
            Namespace::new("wallets", IdentifierKind::Address).with_seed(&self.wallets),
        ]
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        config.validate().map_err(|error| ConfigError::Invalid {
            path: path.to_path_buf(),
            error,
        })?;
        Ok(config)
    }

    /// Reject values that parse but cannot be used
    fn validate(&self) -> Result<(), String> {
        if self.balance.decimals > MAX_DECIMALS {
            return Err(format!(
                "balance.decimals must be at most {}, got {}",
                MAX_DECIMALS, self.balance.decimals
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("singularity").join("config.toml")),
            Some(PathBuf::from("/etc/singularity/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any `SINGULARITY_*` lookup
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(data_dir) = lookup("SINGULARITY_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // API overrides
        if let Some(host) = lookup("SINGULARITY_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("SINGULARITY_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Market overrides
        if let Some(url) = lookup("SINGULARITY_MARKET_URL") {
            self.market.base_url = url;
        }
        if let Some(provider) = lookup("SINGULARITY_MARKET_PROVIDER") {
            match provider.parse() {
                Ok(p) => self.market.provider = p,
                Err(e) => tracing::warn!("Ignoring SINGULARITY_MARKET_PROVIDER: {}", e),
            }
        }
        if let Some(currency) = lookup("SINGULARITY_VS_CURRENCY") {
            self.market.vs_currency = currency;
        }
        if let Some(key) = lookup("SINGULARITY_COINGECKO_API_KEY") {
            self.market.api_key = Some(key);
        }

        // Balance overrides
        if let Some(key) = lookup("SINGULARITY_ETHERSCAN_API_KEY") {
            self.balance.api_key = key;
        }

        // Logging overrides
        if let Some(level) = lookup("SINGULARITY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SINGULARITY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid config file {path:?}: {error}")]
    Invalid { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Singularity Configuration
#
# Environment variables override these settings:
# - SINGULARITY_DATA_DIR
# - SINGULARITY_API_HOST
# - SINGULARITY_API_PORT
# - SINGULARITY_MARKET_PROVIDER
# - SINGULARITY_MARKET_URL
# - SINGULARITY_VS_CURRENCY
# - SINGULARITY_COINGECKO_API_KEY
# - SINGULARITY_ETHERSCAN_API_KEY
# - SINGULARITY_LOG_LEVEL
# - SINGULARITY_LOG_FORMAT

[storage]
# Directory holding one JSON file per list
data_dir = "~/.local/share/singularity"

[market]
# Market data source: coingecko or demo (canned figures, no network)
provider = "coingecko"

# CoinGecko API base URL
base_url = "https://api.coingecko.com/api/v3"

# Quote currency
vs_currency = "usd"

# Optional CoinGecko demo API key
# api_key = ""

# Request timeout (ms)
request_timeout_ms = 10000

[balance]
# Etherscan-compatible API base URL
base_url = "https://api.etherscan.io/api"

# Etherscan API key (empty uses the anonymous rate limit)
api_key = ""

# Decimals of the native unit (18 for ETH)
decimals = 18

# Request timeout (ms)
request_timeout_ms = 10000

[lists]
# Shown while nothing has been stored for a list
watchlist = ["bitcoin", "ethereum", "solana"]
portfolio = []
wallets = []

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
