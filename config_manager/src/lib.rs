use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] ConfigError),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// General system settings
    pub system: SystemSettings,

    /// OpenSea marketplace API configuration
    pub opensea: OpenSeaConfig,

    /// Unique token collection refresh configuration
    pub unique_tokens: UniqueTokensConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Enable debug mode (raises the default log level to debug)
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSeaConfig {
    /// OpenSea API key, sent as the X-Api-Key header
    pub api_key: String,

    /// API host without the network prefix (e.g. "api.opensea.io")
    pub api_host: String,

    /// Timeout for the fungibility probe and every history page, in seconds
    pub history_timeout_seconds: u64,

    /// Timeout for account asset pages, in seconds
    pub assets_timeout_seconds: u64,

    /// Timeout for last sale, listing and floor price lookups, in seconds
    pub price_timeout_seconds: u64,

    /// How the history paginator advances its offset between pages
    pub history_offset_policy: HistoryOffsetPolicy,
}

/// Offset advance between event history pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOffsetPolicy {
    /// `offset = accumulated + 1`, the behavior the wallet has always shipped with.
    /// Skips one record at every page boundary.
    #[default]
    SkipOne,
    /// `offset = accumulated`
    Contiguous,
}

impl HistoryOffsetPolicy {
    /// Offset to request after `accumulated` events have been collected
    pub fn next_offset(&self, accumulated: usize) -> usize {
        match self {
            HistoryOffsetPolicy::SkipOne => accumulated + 1,
            HistoryOffsetPolicy::Contiguous => accumulated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueTokensConfig {
    /// Polling interval for the unique token refresh task, in seconds
    pub refresh_interval_seconds: u64,

    /// Network used when none is given on the command line
    pub default_network: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            system: SystemSettings { debug_mode: false },
            opensea: OpenSeaConfig {
                api_key: "".to_string(), // Must be set in .env or config file
                api_host: "api.opensea.io".to_string(),
                history_timeout_seconds: 10,
                assets_timeout_seconds: 20,
                price_timeout_seconds: 5,
                history_offset_policy: HistoryOffsetPolicy::SkipOne,
            },
            unique_tokens: UniqueTokensConfig {
                refresh_interval_seconds: 15,
                default_network: "mainnet".to_string(),
            },
        }
    }
}

impl OpenSeaConfig {
    /// Validate OpenSea configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_host.trim().is_empty() {
            return Err(ConfigurationError::InvalidValue(
                "OpenSea API host cannot be empty".to_string(),
            ));
        }

        if self.history_timeout_seconds == 0
            || self.assets_timeout_seconds == 0
            || self.price_timeout_seconds == 0
        {
            return Err(ConfigurationError::InvalidValue(
                "Request timeouts must be greater than 0".to_string(),
            ));
        }

        if self.api_key.is_empty() {
            warn!("OpenSea API key is empty, mainnet requests will be rejected");
        }

        Ok(())
    }
}

impl UniqueTokensConfig {
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_seconds == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Refresh interval must be greater than 0".to_string(),
            ));
        }

        normalize_network(&self.default_network).map_err(ConfigurationError::InvalidValue)?;

        Ok(())
    }
}

impl SystemConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config_builder = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&SystemConfig::default())?);

        if config_path.as_ref().exists() {
            info!(
                "Loading configuration from: {}",
                config_path.as_ref().display()
            );
            config_builder = config_builder.add_source(File::from(config_path.as_ref()));
        } else {
            debug!("Config file not found, using defaults and environment variables");
        }

        // NFT_OPENSEA__API_KEY, NFT_UNIQUE_TOKENS__REFRESH_INTERVAL_SECONDS, ...
        config_builder = config_builder.add_source(
            Environment::with_prefix("NFT")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        );

        let mut system_config: SystemConfig = config_builder.build()?.try_deserialize()?;

        let original_network = system_config.unique_tokens.default_network.clone();
        system_config.unique_tokens.default_network = normalize_network(&original_network)
            .unwrap_or_else(|_| {
                warn!("Keeping unrecognized default_network: '{}'", original_network);
                original_network.clone()
            });

        if original_network != system_config.unique_tokens.default_network {
            info!(
                "Normalized default_network in configuration: '{}' -> '{}'",
                original_network, system_config.unique_tokens.default_network
            );
        }

        system_config.validate()?;

        Ok(system_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.opensea.validate()?;
        self.unique_tokens.validate()?;
        Ok(())
    }
}

/// Normalize network names to the identifiers OpenSea uses in its host prefix
pub fn normalize_network(input: &str) -> std::result::Result<String, String> {
    match input.trim().to_lowercase().as_str() {
        "mainnet" | "ethereum" | "eth" | "homestead" => Ok("mainnet".to_string()),
        "ropsten" => Ok("ropsten".to_string()),
        "kovan" => Ok("kovan".to_string()),
        "rinkeby" => Ok("rinkeby".to_string()),
        "goerli" | "gorli" => Ok("goerli".to_string()),
        _ => Err(format!("Unsupported network: '{}'", input)),
    }
}
