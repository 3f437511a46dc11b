use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::str::FromStr;

use crate::config::{parse_address, AppConfig, NetworkConfig};
use crate::error::{ConfigError, NetworkError};
use crate::logging::LogContext;

/// ABI of the standard ERC-20 `transfer`, used when a network names no ABI file
pub const ERC20_TRANSFER_ABI: &str = r#"[
  {
    "type": "function",
    "name": "transfer",
    "stateMutability": "nonpayable",
    "inputs": [
      { "name": "to", "type": "address" },
      { "name": "amount", "type": "uint256" }
    ],
    "outputs": [{ "name": "", "type": "bool" }]
  }
]"#;

/// Networks the relay knows how to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkName {
    Ethereum,
    Polygon,
    Linea,
    LineaSepolia,
}

impl NetworkName {
    pub const ALL: [NetworkName; 4] = [
        NetworkName::Ethereum,
        NetworkName::Polygon,
        NetworkName::Linea,
        NetworkName::LineaSepolia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkName::Ethereum => "ethereum",
            NetworkName::Polygon => "polygon",
            NetworkName::Linea => "linea",
            NetworkName::LineaSepolia => "linea-sepolia",
        }
    }

    /// Prefix of the per-network environment variables
    pub fn env_prefix(&self) -> &'static str {
        match self {
            NetworkName::Ethereum => "ETHEREUM",
            NetworkName::Polygon => "POLYGON",
            NetworkName::Linea => "LINEA",
            NetworkName::LineaSepolia => "LINEA_SEPOLIA",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            NetworkName::Ethereum => 1,
            NetworkName::Polygon => 137,
            NetworkName::Linea => 59144,
            NetworkName::LineaSepolia => 59141,
        }
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            NetworkName::Ethereum => "ETH",
            NetworkName::Polygon => "POL",
            NetworkName::Linea => "ETH",
            NetworkName::LineaSepolia => "ETH",
        }
    }

    fn infura_host(&self) -> &'static str {
        match self {
            NetworkName::Ethereum => "mainnet.infura.io",
            NetworkName::Polygon => "polygon-mainnet.infura.io",
            NetworkName::Linea => "linea-mainnet.infura.io",
            NetworkName::LineaSepolia => "linea-sepolia.infura.io",
        }
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkName {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" | "mainnet" => Ok(NetworkName::Ethereum),
            "polygon" => Ok(NetworkName::Polygon),
            "linea" => Ok(NetworkName::Linea),
            "linea-sepolia" | "linea_sepolia" => Ok(NetworkName::LineaSepolia),
            _ => Err(NetworkError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Fungible token contract used for token forwards
#[derive(Debug, Clone)]
pub struct TokenContract {
    pub address: Address,
    pub abi: JsonAbi,
    pub decimals: u32,
}

/// Everything needed to talk to one network. Never mutated after resolution.
#[derive(Debug, Clone)]
pub struct NetworkProfile {
    pub name: NetworkName,
    pub native_symbol: &'static str,
    pub rpc_url: String,
    pub ws_url: Option<String>,
    pub token: Option<TokenContract>,
    pub chain_id: u64,
}

impl NetworkProfile {
    pub fn require_ws_url(&self) -> Result<&str, NetworkError> {
        self.ws_url.as_deref().ok_or_else(|| NetworkError::MissingEndpoint {
            network: self.name.to_string(),
            kind: "WebSocket",
        })
    }

    pub fn require_token(&self) -> Result<&TokenContract, NetworkError> {
        self.token
            .as_ref()
            .ok_or_else(|| NetworkError::MissingToken(self.name.to_string()))
    }
}

/// Lookup table of network profiles, built once at startup
#[derive(Debug, Clone)]
pub struct NetworkResolver {
    profiles: HashMap<NetworkName, NetworkProfile>,
}

impl NetworkResolver {
    /// Materialise a profile for every network that has an HTTP endpoint.
    /// Token ABI files are read here.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let project_id = config
            .networks
            .infura_project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty());

        let mut profiles = HashMap::new();
        for name in NetworkName::ALL {
            let network = config.networks.get(name);

            if let Some(chain_id) = network.chain_id {
                if chain_id != name.chain_id() {
                    return Err(ConfigError::InvalidValue {
                        key: format!("{}_CHAIN_ID", name.env_prefix()),
                        value: chain_id.to_string(),
                    });
                }
            }

            let rpc_url = network
                .rpc_url
                .clone()
                .or_else(|| project_id.map(|id| format!("https://{}/v3/{}", name.infura_host(), id)));
            let Some(rpc_url) = rpc_url else {
                LogContext::new("network", "from_config")
                    .with_network(name.as_str())
                    .debug("No HTTP endpoint configured, network unavailable");
                continue;
            };
            let ws_url = network
                .ws_url
                .clone()
                .or_else(|| project_id.map(|id| format!("wss://{}/ws/v3/{}", name.infura_host(), id)));

            profiles.insert(
                name,
                NetworkProfile {
                    name,
                    native_symbol: name.native_symbol(),
                    rpc_url,
                    ws_url,
                    token: load_token(name, network)?,
                    chain_id: name.chain_id(),
                },
            );
        }

        Ok(Self { profiles })
    }

    /// Resolve a network by its user-facing name
    pub fn resolve(&self, name: &str) -> Result<NetworkProfile, NetworkError> {
        let name: NetworkName = name.parse()?;
        self.resolve_name(name)
    }

    pub fn resolve_name(&self, name: NetworkName) -> Result<NetworkProfile, NetworkError> {
        self.profiles
            .get(&name)
            .cloned()
            .ok_or_else(|| NetworkError::MissingEndpoint {
                network: name.to_string(),
                kind: "HTTP",
            })
    }
}

fn load_token(name: NetworkName, network: &NetworkConfig) -> Result<Option<TokenContract>, ConfigError> {
    let Some(address) = &network.token_address else {
        return Ok(None);
    };
    let address = parse_address(&format!("{}_TOKEN_ADDRESS", name.env_prefix()), address)?;

    let abi_json = match &network.token_abi_path {
        Some(path) => fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound(path.clone()))?,
        None => ERC20_TRANSFER_ABI.to_string(),
    };
    let abi: JsonAbi = serde_json::from_str(&abi_json)
        .map_err(|e| ConfigError::Parsing(format!("token ABI for {}: {}", name, e)))?;

    Ok(Some(TokenContract {
        address,
        abi,
        decimals: network.token_decimals,
    }))
}
