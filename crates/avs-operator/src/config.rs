//! Operator configuration.
//!
//! A TOML file (`--config`, else `$AVS_DATA_DIR/operator.toml`, else
//! `~/.avs-operator/operator.toml`) provides the base values; environment
//! variables override them. The signing key is never read from the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{bail, Context};
use avs_oracle::predictor::MAX_ALPHA_BPS;
use avs_oracle::TwapWindows;
use serde::{Deserialize, Serialize};

/// Config file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "operator.toml";

/// Uniswap v3 USDC/WETH 0.05% pool on mainnet.
pub const DEFAULT_POOL: &str = "0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640";

/// Environment variable holding the operator signing key.
pub const PRIVATE_KEY_ENV: &str = "OPERATOR_PRIVKEY";

/// Complete operator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub round: RoundConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// RPC endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// HTTP JSON-RPC endpoint. Required.
    #[serde(default)]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Per-request deadline.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Contract addresses, hex encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// AVS manager receiving commits and reveals. Required.
    #[serde(default)]
    pub avs_manager: String,
    #[serde(default = "default_pool")]
    pub pool: String,
    /// TWAP aggregator. Empty = read the base price from the pool.
    #[serde(default)]
    pub aggregator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default = "default_twap_long")]
    pub twap_long_secs: u32,
    #[serde(default = "default_twap_short")]
    pub twap_short_secs: u32,
    /// Drift sensitivity, `0..=10000`.
    #[serde(default = "default_alpha")]
    pub alpha_bps: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundConfig {
    #[serde(default = "default_reveal_delay")]
    pub reveal_delay_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

// Default value functions

fn default_chain_id() -> u64 {
    1
}

fn default_request_timeout() -> u64 {
    30
}

fn default_pool() -> String {
    DEFAULT_POOL.to_string()
}

fn default_twap_long() -> u32 {
    300
}

fn default_twap_short() -> u32 {
    30
}

fn default_alpha() -> i64 {
    200
}

fn default_reveal_delay() -> u64 {
    15
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            chain_id: default_chain_id(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            avs_manager: String::new(),
            pool: default_pool(),
            aggregator: String::new(),
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            twap_long_secs: default_twap_long(),
            twap_short_secs: default_twap_short(),
            alpha_bps: default_alpha(),
        }
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            reveal_delay_secs: default_reveal_delay(),
        }
    }
}

fn parse_env<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid {key}='{value}'"))
}

fn parse_address(field: &str, value: &str) -> anyhow::Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("invalid {field} address '{value}'"))
}

impl OperatorConfig {
    /// Load the config file, then apply environment overrides.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load(explicit_path: Option<&Path>) -> anyhow::Result<Self> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
        } else if explicit_path.is_some() {
            bail!("config file {} does not exist", path.display());
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from environment variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RPC_URL") {
            self.chain.rpc_url = v;
        }
        if let Some(v) = lookup("CHAIN_ID") {
            self.chain.chain_id = parse_env("CHAIN_ID", &v)?;
        }
        if let Some(v) = lookup("RPC_TIMEOUT_SECS") {
            self.chain.request_timeout_secs = parse_env("RPC_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("AVS_MANAGER_ADDR") {
            self.contracts.avs_manager = v;
        }
        if let Some(v) = lookup("POOL_ADDR") {
            self.contracts.pool = v;
        }
        if let Some(v) = lookup("AGGREGATOR_ADDR") {
            self.contracts.aggregator = v;
        }
        if let Some(v) = lookup("TWAP_LONG_SEC") {
            self.prediction.twap_long_secs = parse_env("TWAP_LONG_SEC", &v)?;
        }
        if let Some(v) = lookup("TWAP_SHORT_SEC") {
            self.prediction.twap_short_secs = parse_env("TWAP_SHORT_SEC", &v)?;
        }
        if let Some(v) = lookup("ALPHA_BPS") {
            self.prediction.alpha_bps = parse_env("ALPHA_BPS", &v)?;
        }
        if let Some(v) = lookup("REVEAL_DELAY_SECS") {
            self.round.reveal_delay_secs = parse_env("REVEAL_DELAY_SECS", &v)?;
        }
        if let Some(v) = lookup("AVS_DATA_DIR") {
            self.storage.data_dir = v;
        }
        Ok(())
    }

    /// Check everything a price read needs.
    pub fn validate_reads(&self) -> anyhow::Result<()> {
        if self.chain.rpc_url.trim().is_empty() {
            bail!("RPC_URL is required");
        }
        self.pool_address()?;
        self.aggregator_address()?;
        self.windows()?;
        let alpha = self.prediction.alpha_bps;
        if !(0..=MAX_ALPHA_BPS).contains(&alpha) {
            bail!("ALPHA_BPS must be within [0, {MAX_ALPHA_BPS}], got {alpha}");
        }
        Ok(())
    }

    /// Check everything a commit or reveal needs.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_reads()?;
        if self.contracts.avs_manager.trim().is_empty() {
            bail!("AVS_MANAGER_ADDR is required");
        }
        self.avs_manager_address()?;
        Ok(())
    }

    pub fn avs_manager_address(&self) -> anyhow::Result<Address> {
        parse_address("AVS manager", &self.contracts.avs_manager)
    }

    pub fn pool_address(&self) -> anyhow::Result<Address> {
        parse_address("pool", &self.contracts.pool)
    }

    /// `None` selects direct-pool mode.
    pub fn aggregator_address(&self) -> anyhow::Result<Option<Address>> {
        let raw = self.contracts.aggregator.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        parse_address("aggregator", raw).map(Some)
    }

    pub fn windows(&self) -> anyhow::Result<TwapWindows> {
        TwapWindows::new(
            self.prediction.twap_short_secs,
            self.prediction.twap_long_secs,
        )
        .context("TWAP_SHORT_SEC and TWAP_LONG_SEC must be non-zero")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.chain.request_timeout_secs)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_secs(self.round.reveal_delay_secs)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join(CONFIG_FILE_NAME)
    }

    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("AVS_DATA_DIR") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".avs-operator"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/avs-operator"))
    }
}
