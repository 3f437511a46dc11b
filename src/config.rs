use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::network::NetworkName;
use crate::transfer::AssetKind;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub wallet: WalletConfig,
    pub transfer: TransferConfig,
    pub watch: WatchConfig,
    pub rpc: RpcConfig,
    pub networks: NetworksConfig,
    pub logging: LoggingConfig,
}

/// Sender key and the two addresses involved in a forward
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Hex private key of the monitored (sending) account. Never serialized.
    #[serde(skip_serializing)]
    pub private_key: String,
    /// Monitored account; must match the private key
    pub sender_address: String,
    /// Account that receives forwarded value
    pub receiver_address: String,
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &"<redacted>")
            .field("sender_address", &self.sender_address)
            .field("receiver_address", &self.receiver_address)
            .finish()
    }
}

/// Transfer parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Fixed amount for one-shot sends, in whole coin units. Absent means
    /// the amount must be given on the command line.
    pub amount: Option<Decimal>,
    /// Smallest balance increase treated as incoming payment, in whole units
    pub min_income: Decimal,
    /// Gas limit for native transfers
    pub gas_limit: u64,
    /// Gas limit for token contract calls
    pub token_gas_limit: u64,
    /// Asset used when forwarding
    pub forward_asset: AssetKind,
    /// How long to wait for a receipt
    pub confirmation_timeout_seconds: u64,
}

/// Observation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WatchStrategy {
    Polling,
    Push,
}

/// Which push feed to subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushTopicKind {
    /// `newPendingTransactions`
    Pending,
    /// ERC-20 `Transfer` logs from the network's token paying the monitored address
    Logs,
}

/// Watch loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub strategy: WatchStrategy,
    /// Balance polling interval in seconds
    pub poll_interval_seconds: u64,
    pub push_topic: PushTopicKind,
    /// Push strategy: also treat transactions addressed to the receiver as incoming
    pub accept_receiver_as_recipient: bool,
}

/// RPC client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum attempts for read-only calls
    pub max_retries: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Receipt polling interval in milliseconds
    pub receipt_poll_interval_ms: u64,
}

/// Per-network endpoints and token contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub rpc_url: Option<String>,
    pub ws_url: Option<String>,
    /// Must equal the network's well-known chain id when set
    pub chain_id: Option<u64>,
    pub token_address: Option<String>,
    /// JSON ABI file of the token contract; the standard ERC-20 `transfer` is used when absent
    pub token_abi_path: Option<String>,
    pub token_decimals: u32,
}

/// All selectable networks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworksConfig {
    /// Network used when none is given on the command line
    pub default_network: String,
    /// Used to derive Infura endpoints for networks without explicit URLs
    pub infura_project_id: Option<String>,
    pub ethereum: NetworkConfig,
    pub polygon: NetworkConfig,
    pub linea: NetworkConfig,
    pub linea_sepolia: NetworkConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            amount: None,
            min_income: Decimal::new(1, 4),
            gas_limit: 21_000,
            token_gas_limit: 100_000,
            forward_asset: AssetKind::Native,
            confirmation_timeout_seconds: 120,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            strategy: WatchStrategy::Polling,
            poll_interval_seconds: 2,
            push_topic: PushTopicKind::Pending,
            accept_receiver_as_recipient: false,
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_ms: 500,
            max_retry_delay_ms: 5_000,
            receipt_poll_interval_ms: 1_000,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            ws_url: None,
            chain_id: None,
            token_address: None,
            token_abi_path: None,
            token_decimals: 18,
        }
    }
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            default_network: NetworkName::Ethereum.as_str().to_string(),
            infura_project_id: None,
            ethereum: NetworkConfig::default(),
            polygon: NetworkConfig::default(),
            linea: NetworkConfig::default(),
            linea_sepolia: NetworkConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl FromStr for WatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "poll" => Ok(Self::Polling),
            "push" | "websocket" | "ws" => Ok(Self::Push),
            other => Err(format!("unknown watch strategy '{}'", other)),
        }
    }
}

impl FromStr for PushTopicKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "newpendingtransactions" => Ok(Self::Pending),
            "logs" => Ok(Self::Logs),
            other => Err(format!("unknown push topic '{}'", other)),
        }
    }
}

impl NetworksConfig {
    pub fn get(&self, name: NetworkName) -> &NetworkConfig {
        match name {
            NetworkName::Ethereum => &self.ethereum,
            NetworkName::Polygon => &self.polygon,
            NetworkName::Linea => &self.linea,
            NetworkName::LineaSepolia => &self.linea_sepolia,
        }
    }

    pub fn get_mut(&mut self, name: NetworkName) -> &mut NetworkConfig {
        match name {
            NetworkName::Ethereum => &mut self.ethereum,
            NetworkName::Polygon => &mut self.polygon,
            NetworkName::Linea => &mut self.linea,
            NetworkName::LineaSepolia => &mut self.linea_sepolia,
        }
    }
}

/// Read and parse an environment variable; absent variables yield `None`
fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Parse an address field, naming the offending key on failure
pub fn parse_address(key: &str, value: &str) -> Result<Address, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidAddress {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the TOML file named by `CONFIG_FILE`
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "forwarder.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(&config_path).map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Wallet
        if let Ok(key) = env::var("PRIVATE_KEY_SENDER") {
            self.wallet.private_key = key;
        }
        if let Ok(address) = env::var("ADDRESS_SENDER") {
            self.wallet.sender_address = address;
        }
        if let Ok(address) = env::var("ADDRESS_RECEIVER") {
            self.wallet.receiver_address = address;
        }

        // Transfer
        if let Some(amount) = env_parse::<Decimal>("VALUE_ETHER")? {
            self.transfer.amount = Some(amount);
        }
        if let Some(min_income) = env_parse("MIN_ETHER_INCOME")? {
            self.transfer.min_income = min_income;
        }
        if let Some(gas_limit) = env_parse("GAS_LIMIT")? {
            self.transfer.gas_limit = gas_limit;
        }
        if let Some(gas_limit) = env_parse("TOKEN_GAS_LIMIT")? {
            self.transfer.token_gas_limit = gas_limit;
        }
        if let Some(asset) = env_parse("FORWARD_ASSET")? {
            self.transfer.forward_asset = asset;
        }
        if let Some(timeout) = env_parse("CONFIRMATION_TIMEOUT_SECONDS")? {
            self.transfer.confirmation_timeout_seconds = timeout;
        }

        // Watch loop
        if let Some(strategy) = env_parse("WATCH_STRATEGY")? {
            self.watch.strategy = strategy;
        }
        if let Some(interval) = env_parse("POLL_INTERVAL_SECONDS")? {
            self.watch.poll_interval_seconds = interval;
        }
        if let Some(topic) = env_parse("PUSH_TOPIC")? {
            self.watch.push_topic = topic;
        }
        if let Some(accept) = env_parse("ACCEPT_RECEIVER_AS_RECIPIENT")? {
            self.watch.accept_receiver_as_recipient = accept;
        }

        // RPC
        if let Some(timeout) = env_parse("RPC_TIMEOUT_SECONDS")? {
            self.rpc.timeout_seconds = timeout;
        }
        if let Some(retries) = env_parse("RPC_MAX_RETRIES")? {
            self.rpc.max_retries = retries;
        }

        // Networks
        if let Ok(network) = env::var("NETWORK") {
            self.networks.default_network = network;
        }
        if let Ok(project_id) = env::var("INFURA_PROJECT_ID") {
            self.networks.infura_project_id = Some(project_id);
        }
        for name in NetworkName::ALL {
            let prefix = name.env_prefix();
            let network = self.networks.get_mut(name);

            if let Ok(url) = env::var(format!("{}_RPC_URL", prefix)) {
                network.rpc_url = Some(url);
            }
            if let Ok(url) = env::var(format!("{}_WS_URL", prefix)) {
                network.ws_url = Some(url);
            }
            if let Some(chain_id) = env_parse(&format!("{}_CHAIN_ID", prefix))? {
                network.chain_id = Some(chain_id);
            }
            if let Ok(address) = env::var(format!("{}_TOKEN_ADDRESS", prefix)) {
                network.token_address = Some(address);
            }
            if let Ok(path) = env::var(format!("{}_TOKEN_ABI_PATH", prefix)) {
                network.token_abi_path = Some(path);
            }
            if let Some(decimals) = env_parse(&format!("{}_TOKEN_DECIMALS", prefix))? {
                network.token_decimals = decimals;
            }
        }

        // Logging
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wallet.private_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("PRIVATE_KEY_SENDER".to_string()));
        }
        if self.wallet.sender_address.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("ADDRESS_SENDER".to_string()));
        }
        if self.wallet.receiver_address.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("ADDRESS_RECEIVER".to_string()));
        }
        parse_address("wallet.sender_address", &self.wallet.sender_address)?;
        parse_address("wallet.receiver_address", &self.wallet.receiver_address)?;

        if self.transfer.min_income.is_sign_negative() {
            return Err(ConfigError::InvalidValue {
                key: "transfer.min_income".to_string(),
                value: self.transfer.min_income.to_string(),
            });
        }
        if self.transfer.gas_limit == 0 || self.transfer.token_gas_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "transfer.gas_limit".to_string(),
                value: format!("{}/{}", self.transfer.gas_limit, self.transfer.token_gas_limit),
            });
        }
        if self.transfer.confirmation_timeout_seconds == 0
            || self.transfer.confirmation_timeout_seconds > 3_600
        {
            return Err(ConfigError::InvalidValue {
                key: "transfer.confirmation_timeout_seconds".to_string(),
                value: self.transfer.confirmation_timeout_seconds.to_string(),
            });
        }

        if self.watch.poll_interval_seconds == 0 || self.watch.poll_interval_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "watch.poll_interval_seconds".to_string(),
                value: self.watch.poll_interval_seconds.to_string(),
            });
        }

        if self.rpc.timeout_seconds == 0 || self.rpc.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.timeout_seconds".to_string(),
                value: self.rpc.timeout_seconds.to_string(),
            });
        }
        if self.rpc.max_retries == 0 || self.rpc.max_retries > 20 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.max_retries".to_string(),
                value: self.rpc.max_retries.to_string(),
            });
        }
        if self.rpc.receipt_poll_interval_ms == 0 || self.rpc.receipt_poll_interval_ms > 60_000 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.receipt_poll_interval_ms".to_string(),
                value: self.rpc.receipt_poll_interval_ms.to_string(),
            });
        }

        if self.networks.default_network.parse::<NetworkName>().is_err() {
            return Err(ConfigError::InvalidValue {
                key: "networks.default_network".to_string(),
                value: self.networks.default_network.clone(),
            });
        }
        for name in NetworkName::ALL {
            self.validate_network(name)?;
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    fn validate_network(&self, name: NetworkName) -> Result<(), ConfigError> {
        let network = self.networks.get(name);

        if let Some(url) = &network.rpc_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if let Some(url) = &network.ws_url {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if let Some(chain_id) = network.chain_id {
            if chain_id != name.chain_id() {
                return Err(ConfigError::InvalidValue {
                    key: format!("{}_CHAIN_ID", name.env_prefix()),
                    value: chain_id.to_string(),
                });
            }
        }
        if let Some(address) = &network.token_address {
            parse_address(&format!("{}_TOKEN_ADDRESS", name.env_prefix()), address)?;
        }
        if network.token_decimals > 28 {
            return Err(ConfigError::InvalidValue {
                key: format!("{}_TOKEN_DECIMALS", name.env_prefix()),
                value: network.token_decimals.to_string(),
            });
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    const SENDER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const RECEIVER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.wallet.private_key =
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string();
        config.wallet.sender_address = SENDER.to_string();
        config.wallet.receiver_address = RECEIVER.to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.watch.poll_interval_seconds, 2);
        assert_eq!(config.transfer.confirmation_timeout_seconds, 120);
        assert_eq!(config.transfer.min_income, Decimal::new(1, 4));
        assert_eq!(config.transfer.amount, None);
        assert_eq!(config.transfer.forward_asset, AssetKind::Native);
        assert_eq!(config.networks.default_network, "ethereum");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        assert!(valid_config().validate().is_ok());

        let mut config = valid_config();
        config.wallet.private_key.clear();
        assert!(matches!(config.validate(), Err(ConfigError::MissingEnvVar(_))));

        let mut config = valid_config();
        config.wallet.receiver_address = "0x1234".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAddress { .. })));

        let mut config = valid_config();
        config.watch.poll_interval_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.networks.default_network = "moon".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.networks.polygon.chain_id = Some(1);
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.networks.linea.ws_url = Some("https://not-a-socket".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_receipt_poll_interval_must_be_positive() {
        let mut config = valid_config();
        config.rpc.receipt_poll_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "rpc.receipt_poll_interval_ms"
        ));

        config.rpc.receipt_poll_interval_ms = 250;
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var("ADDRESS_RECEIVER", RECEIVER);
        env::set_var("VALUE_ETHER", "0.05");
        env::set_var("MIN_ETHER_INCOME", "0.001");
        env::set_var("FORWARD_ASSET", "token");
        env::set_var("NETWORK", "polygon");
        env::set_var("POLYGON_WS_URL", "wss://polygon.example/ws");
        env::set_var("POLYGON_CHAIN_ID", "137");

        let mut config = AppConfig::default();
        config.apply_env_overrides().unwrap();

        assert_eq!(config.wallet.receiver_address, RECEIVER);
        assert_eq!(config.transfer.amount, Some(Decimal::new(5, 2)));
        assert_eq!(config.transfer.min_income, Decimal::new(1, 3));
        assert_eq!(config.transfer.forward_asset, AssetKind::Token);
        assert_eq!(config.networks.default_network, "polygon");
        assert_eq!(config.networks.polygon.ws_url.as_deref(), Some("wss://polygon.example/ws"));
        assert_eq!(config.networks.polygon.chain_id, Some(137));

        for key in [
            "ADDRESS_RECEIVER",
            "VALUE_ETHER",
            "MIN_ETHER_INCOME",
            "FORWARD_ASSET",
            "NETWORK",
            "POLYGON_WS_URL",
            "POLYGON_CHAIN_ID",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_zero_amount_is_not_absent() {
        env::set_var("VALUE_ETHER", "0");

        let mut config = AppConfig::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.transfer.amount, Some(Decimal::ZERO));

        env::remove_var("VALUE_ETHER");
    }

    #[test]
    #[serial]
    fn test_invalid_env_values() {
        env::set_var("GAS_LIMIT", "lots");

        let mut config = AppConfig::default();
        let result = config.apply_env_overrides();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        env::remove_var("GAS_LIMIT");
    }

    #[test]
    #[serial]
    fn test_config_file_loading() {
        let config_content = r#"
[wallet]
private_key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
sender_address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
receiver_address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

[transfer]
min_income = "0.0005"
gas_limit = 30000
forward_asset = "native"

[watch]
strategy = "push"
push_topic = "logs"

[networks]
default_network = "linea-sepolia"

[networks.linea_sepolia]
rpc_url = "https://rpc.sepolia.linea.build"
ws_url = "wss://rpc.sepolia.linea.build"

[logging]
level = "debug"
format = "json"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut temp_file, config_content.as_bytes()).unwrap();
        env::set_var("CONFIG_FILE", temp_file.path().to_str().unwrap());

        let config = AppConfig::load_from_file().unwrap();

        assert_eq!(config.wallet.sender_address, SENDER);
        assert_eq!(config.transfer.min_income, Decimal::new(5, 4));
        assert_eq!(config.transfer.gas_limit, 30_000);
        assert_eq!(config.transfer.token_gas_limit, 100_000);
        assert_eq!(config.watch.strategy, WatchStrategy::Push);
        assert_eq!(config.watch.push_topic, PushTopicKind::Logs);
        assert_eq!(config.watch.poll_interval_seconds, 2);
        assert_eq!(config.networks.default_network, "linea-sepolia");
        assert_eq!(
            config.networks.linea_sepolia.rpc_url.as_deref(),
            Some("https://rpc.sepolia.linea.build")
        );
        assert_eq!(config.logging.format, "json");
        assert!(config.validate().is_ok());

        env::remove_var("CONFIG_FILE");
    }

    #[test]
    fn test_sample_config_omits_private_key() {
        let mut config = valid_config();
        config.wallet.private_key = "secret".to_string();

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(!format!("{:?}", config.wallet).contains("secret"));

        let sample = AppConfig::generate_sample_config().unwrap();
        assert!(sample.contains("[transfer]"));
        assert!(sample.contains("[networks.polygon]"));
    }
}
