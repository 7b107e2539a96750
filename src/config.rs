use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ergo_swap_sdk::{EngineConfig, Network};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CONFIG_FILE: &str = "ergo_swap_config.json";
const DATA_DIR_NAME: &str = ".ergo-swap";

/// Environment variables that override the persisted config.
pub const ENV_NETWORK: &str = "ERGO_SWAP_NETWORK";
pub const ENV_EXPLORER_URL: &str = "ERGO_SWAP_EXPLORER_URL";
pub const ENV_NODE_URL: &str = "ERGO_SWAP_NODE_URL";
pub const ENV_NODE_API_KEY: &str = "ERGO_SWAP_NODE_API_KEY";
pub const ENV_ORDER_CONTRACT: &str = "ERGO_SWAP_ORDER_CONTRACT";
pub const ENV_ADDRESS: &str = "ERGO_SWAP_ADDRESS";

// ============================================================================
// Persisted app config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub network: Network,
    /// Default wallet address for `balance` and `swap`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub pool_refresh_secs: u64,
    pub mainnet: EngineConfig,
    pub testnet: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            address: None,
            pool_refresh_secs: 60,
            mainnet: EngineConfig::for_network(Network::Mainnet),
            testnet: EngineConfig::for_network(Network::Testnet),
        }
    }
}

/// On-disk shape: every key optional, engine sections merged over the
/// defaults of their own network.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredConfig {
    network: Option<Network>,
    address: Option<String>,
    pool_refresh_secs: Option<u64>,
    mainnet: Map<String, Value>,
    testnet: Map<String, Value>,
}

fn engine_section(network: Network, stored: Map<String, Value>) -> Result<EngineConfig> {
    let mut merged = match serde_json::to_value(EngineConfig::for_network(network))? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merged.extend(stored);
    merged.insert("network".into(), serde_json::to_value(network)?);
    serde_json::from_value(Value::Object(merged))
        .with_context(|| format!("{network} engine config"))
}

impl AppConfig {
    /// `$HOME/.ergo-swap`, or the working directory when `HOME` is unset.
    pub fn default_data_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
    }

    /// Load `ergo_swap_config.json` from `dir`; a missing file yields the
    /// defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let stored: StoredConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        let defaults = Self::default();
        Ok(Self {
            network: stored.network.unwrap_or(defaults.network),
            address: stored.address,
            pool_refresh_secs: stored.pool_refresh_secs.unwrap_or(defaults.pool_refresh_secs),
            mainnet: engine_section(Network::Mainnet, stored.mainnet)?,
            testnet: engine_section(Network::Testnet, stored.testnet)?,
        })
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn engine(&self, network: Network) -> &EngineConfig {
        match network {
            Network::Mainnet => &self.mainnet,
            Network::Testnet => &self.testnet,
        }
    }

    pub fn engine_mut(&mut self, network: Network) -> &mut EngineConfig {
        match network {
            Network::Mainnet => &mut self.mainnet,
            Network::Testnet => &mut self.testnet,
        }
    }

    /// Apply `ERGO_SWAP_*` overrides read through `var`.
    ///
    /// The network is resolved first (`cli_network`, then `ERGO_SWAP_NETWORK`,
    /// then the file); endpoint overrides then apply to that network's engine
    /// config.
    pub fn apply_env(
        &mut self,
        cli_network: Option<Network>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(network) = var(ENV_NETWORK) {
            self.network = network
                .parse()
                .map_err(|e: String| anyhow::anyhow!("{ENV_NETWORK}: {e}"))?;
        }
        if let Some(network) = cli_network {
            self.network = network;
        }
        if let Some(address) = var(ENV_ADDRESS) {
            self.address = Some(address);
        }
        let engine = self.engine_mut(self.network);
        if let Some(url) = var(ENV_EXPLORER_URL) {
            engine.explorer_url = url;
        }
        if let Some(url) = var(ENV_NODE_URL) {
            engine.node_url = url;
        }
        if let Some(key) = var(ENV_NODE_API_KEY) {
            engine.node_api_key = Some(key);
        }
        if let Some(tree) = var(ENV_ORDER_CONTRACT) {
            engine.swap_order_contract = tree;
        }
        Ok(())
    }

    /// The funding address: `explicit`, else the configured one. It must be a
    /// P2PK address of the selected network.
    pub fn wallet_address(&self, explicit: Option<String>) -> Result<String> {
        let Some(address) = explicit.or_else(|| self.address.clone()) else {
            anyhow::bail!("no address given and none configured (set {ENV_ADDRESS})");
        };
        let prefix = self.network.address_prefix();
        if !address.starts_with(prefix) {
            anyhow::bail!(
                "{address} is not a {} address (expected prefix {prefix})",
                self.network
            );
        }
        Ok(address)
    }
}
