use serde::{Deserialize, Serialize};

/// Ergo network variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Mainnet, Network::Testnet];

    pub fn is_mainnet(self) -> bool {
        matches!(self, Network::Mainnet)
    }

    pub fn default_explorer_url(self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.ergoplatform.com",
            Network::Testnet => "https://api-testnet.ergoplatform.com",
        }
    }

    pub fn default_node_url(self) -> &'static str {
        match self {
            Network::Mainnet => "http://127.0.0.1:9053",
            Network::Testnet => "http://127.0.0.1:9052",
        }
    }

    /// Leading character of P2PK addresses on this network.
    pub fn address_prefix(self) -> char {
        match self {
            Network::Mainnet => '9',
            Network::Testnet => '3',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "ergo" => Ok(Network::Mainnet),
            "testnet" | "test" | "ergo-testnet" => Ok(Network::Testnet),
            _ => Err(format!("invalid network: {}", s)),
        }
    }
}
