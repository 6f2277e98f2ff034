//! Configuration management for the buy-watch operator
//!
//! Loads configuration from optional config files and environment variables.
//! Environment variables override file values.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{intervals, native, polling};

/// Root configuration structure
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Discord bot and channel settings
    pub discord: DiscordConfig,
    /// Ledger RPC and buy detection settings
    pub ledger: LedgerConfig,
    /// Fiat rate oracle settings
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Floor tracker settings
    #[serde(default)]
    pub floor: FloorConfig,
    /// Price data provider settings
    #[serde(default)]
    pub price_data: PriceDataConfig,
    /// Status server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Discord configuration
#[derive(Debug, Deserialize)]
pub struct DiscordConfig {
    /// Bot token (BUYWATCH_DISCORD__BOT_TOKEN)
    pub bot_token: SecretString,
    /// Channel receiving buy and floor alerts
    pub feed_channel_id: u64,
    /// Channel receiving market updates
    pub discussion_channel_id: u64,
    /// REST API base URL
    #[serde(default = "default_discord_api")]
    pub api_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_discord_timeout")]
    pub timeout_secs: u64,
}

fn default_discord_api() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_discord_timeout() -> u64 {
    10
}

/// Ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Watched token contract address
    pub token_address: String,
    /// Team/treasury wallet excluded from buyer attribution
    pub team_wallet: String,
    /// Signatures requested per listing
    #[serde(default = "default_signature_limit")]
    pub signature_limit: usize,
    /// Newest entries inspected when catching up after a gap
    #[serde(default = "default_catch_up_limit")]
    pub catch_up_limit: usize,
    /// Seconds between ledger polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// RPC request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub request_timeout_secs: u64,
    /// Minimum spend (SOL) for a buy
    #[serde(default = "default_min_buy_sol")]
    pub min_buy_sol: Decimal,
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_signature_limit() -> usize {
    polling::SIGNATURE_LIMIT
}

fn default_catch_up_limit() -> usize {
    polling::CATCH_UP_LIMIT
}

fn default_poll_interval() -> u64 {
    intervals::LEDGER_POLL_SECS
}

fn default_rpc_timeout() -> u64 {
    30
}

fn default_min_buy_sol() -> Decimal {
    Decimal::from_str(polling::MIN_BUY_SOL).unwrap_or(Decimal::ZERO)
}

/// Price oracle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Simple-price endpoint
    #[serde(default = "default_oracle_url")]
    pub url: String,
    /// Asset key in the response body
    #[serde(default = "default_asset_id")]
    pub asset_id: String,
    /// Rate returned when the oracle fails
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: Decimal,
    /// Request timeout in seconds
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
    /// How long a fetched rate is reused
    #[serde(default = "default_oracle_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            url: default_oracle_url(),
            asset_id: default_asset_id(),
            fallback_rate: default_fallback_rate(),
            timeout_secs: default_oracle_timeout(),
            cache_ttl_secs: default_oracle_ttl(),
        }
    }
}

fn default_oracle_url() -> String {
    "https://api.coingecko.com/api/v3/simple/price".to_string()
}

fn default_asset_id() -> String {
    "solana".to_string()
}

fn default_fallback_rate() -> Decimal {
    Decimal::from(native::FALLBACK_USD_RATE)
}

fn default_oracle_timeout() -> u64 {
    10
}

fn default_oracle_ttl() -> u64 {
    30
}

/// Floor tracker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FloorConfig {
    /// Seconds between floor checks
    #[serde(default = "default_floor_interval")]
    pub interval_secs: u64,
    /// Upper bound on a single provider fetch
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_floor_interval(),
            provider_timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_floor_interval() -> u64 {
    intervals::FLOOR_CHECK_SECS
}

fn default_provider_timeout() -> u64 {
    90
}

/// Price data provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PriceDataConfig {
    /// JSON snapshot endpoint; floor tracking is disabled when unset
    #[serde(default)]
    pub snapshot_url: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_price_data_timeout")]
    pub timeout_secs: u64,
}

impl Default for PriceDataConfig {
    fn default() -> Self {
        Self {
            snapshot_url: None,
            timeout_secs: default_price_data_timeout(),
        }
    }
}

fn default_price_data_timeout() -> u64 {
    60
}

/// Status server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Whether to serve the status API
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_server_enabled() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl LedgerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl FloorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest first):
    /// 1. Environment variables (BUYWATCH_*)
    /// 2. config/config.{toml,yaml,json}
    /// 3. config.{toml,yaml,json}
    /// 4. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config/config").required(false))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from an explicit file, still honouring environment overrides
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::from(path).required(true))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("ledger.rpc_url", default_rpc_url())?
            .set_default("ledger.signature_limit", polling::SIGNATURE_LIMIT as u64)?
            .set_default("ledger.catch_up_limit", polling::CATCH_UP_LIMIT as u64)?
            .set_default("ledger.poll_interval_secs", intervals::LEDGER_POLL_SECS)?
            .set_default("floor.interval_secs", intervals::FLOOR_CHECK_SECS)?
            .set_default("server.port", 8080)
    }

    // BUYWATCH_LEDGER__TOKEN_ADDRESS=... -> ledger.token_address
    // BUYWATCH_DISCORD__FEED_CHANNEL_ID=123 -> discord.feed_channel_id
    fn environment() -> Environment {
        Environment::with_prefix("BUYWATCH")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.bot_token.expose_secret().trim().is_empty() {
            return Err(ConfigError::Message(
                "Discord bot token must be set via BUYWATCH_DISCORD__BOT_TOKEN".to_string(),
            ));
        }

        if self.discord.feed_channel_id == 0 || self.discord.discussion_channel_id == 0 {
            return Err(ConfigError::Message(
                "Discord channel IDs must be non-zero integers".to_string(),
            ));
        }

        if self.ledger.rpc_url.is_empty() {
            return Err(ConfigError::Message("Ledger RPC URL must be set".to_string()));
        }

        validate_address("ledger.token_address", &self.ledger.token_address)?;
        validate_address("ledger.team_wallet", &self.ledger.team_wallet)?;

        if self.ledger.signature_limit == 0
            || self.ledger.signature_limit > polling::MAX_SIGNATURE_LIMIT
        {
            return Err(ConfigError::Message(format!(
                "ledger.signature_limit must be between 1 and {}",
                polling::MAX_SIGNATURE_LIMIT
            )));
        }

        if self.ledger.catch_up_limit == 0
            || self.ledger.catch_up_limit > self.ledger.signature_limit
        {
            return Err(ConfigError::Message(
                "ledger.catch_up_limit must be between 1 and ledger.signature_limit".to_string(),
            ));
        }

        if self.ledger.min_buy_sol.is_sign_negative() {
            return Err(ConfigError::Message(
                "ledger.min_buy_sol must not be negative".to_string(),
            ));
        }

        if self.oracle.fallback_rate.is_sign_negative() {
            return Err(ConfigError::Message(
                "oracle.fallback_rate must not be negative".to_string(),
            ));
        }

        let durations = [
            ("ledger.poll_interval_secs", self.ledger.poll_interval_secs),
            ("ledger.request_timeout_secs", self.ledger.request_timeout_secs),
            ("floor.interval_secs", self.floor.interval_secs),
            ("floor.provider_timeout_secs", self.floor.provider_timeout_secs),
            ("oracle.timeout_secs", self.oracle.timeout_secs),
            ("price_data.timeout_secs", self.price_data.timeout_secs),
            ("discord.timeout_secs", self.discord.timeout_secs),
        ];
        for (key, value) in durations {
            if value == 0 {
                return Err(ConfigError::Message(format!("{} must be greater than 0", key)));
            }
        }

        Ok(())
    }
}

fn validate_address(key: &str, value: &str) -> Result<(), ConfigError> {
    Pubkey::from_str(value)
        .map(|_| ())
        .map_err(|e| ConfigError::Message(format!("{} is not a valid address: {}", key, e)))
}
