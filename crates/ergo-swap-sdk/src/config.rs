use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::asset::Amount;
use crate::error::{Error, Result};
use crate::network::Network;
use crate::order::{DEFAULT_FEE_BUDGET_MULTIPLIER, FeePolicy, Nitro};

pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// 0.001 ERG.
pub const DEFAULT_MIN_BOX_VALUE: Amount = 1_000_000;
/// 0.002 ERG.
pub const DEFAULT_MINER_FEE: Amount = 2_000_000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Settings of one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub network: Network,
    pub explorer_url: String,
    pub node_url: String,
    /// Needed only when signing through the node wallet.
    pub node_api_key: Option<String>,
    pub utxo_page_size: u32,
    pub pool_page_size: u32,
    pub fee_budget_multiplier: u32,
    pub min_nitro: Nitro,
    pub min_box_value: Amount,
    pub miner_fee: Amount,
    pub http_timeout_secs: u64,
    /// Hex ErgoTree locking swap-order boxes.
    pub swap_order_contract: String,
}

impl EngineConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            explorer_url: network.default_explorer_url().to_string(),
            node_url: network.default_node_url().to_string(),
            node_api_key: None,
            utxo_page_size: DEFAULT_PAGE_SIZE,
            pool_page_size: DEFAULT_PAGE_SIZE,
            fee_budget_multiplier: DEFAULT_FEE_BUDGET_MULTIPLIER,
            min_nitro: Nitro::default(),
            min_box_value: DEFAULT_MIN_BOX_VALUE,
            miner_fee: DEFAULT_MINER_FEE,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            swap_order_contract: String::new(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn fee_policy(&self) -> FeePolicy {
        FeePolicy {
            miner_fee: self.miner_fee,
            fee_budget_multiplier: self.fee_budget_multiplier,
            min_nitro: self.min_nitro,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.explorer_url.is_empty() || self.node_url.is_empty() {
            return Err(Error::Config("explorer and node URLs are required".into()));
        }
        if self.utxo_page_size == 0 || self.pool_page_size == 0 {
            return Err(Error::Config("page sizes must be positive".into()));
        }
        if self.fee_budget_multiplier == 0 {
            return Err(Error::Config("fee budget multiplier must be positive".into()));
        }
        if self.miner_fee == 0 {
            return Err(Error::Config("miner fee must be positive".into()));
        }
        if self.min_box_value == 0 {
            return Err(Error::Config("minimum box value must be positive".into()));
        }
        if self.http_timeout_secs == 0 {
            return Err(Error::Config("HTTP timeout must be positive".into()));
        }
        if self.swap_order_contract.is_empty() {
            return Err(Error::Config(
                "swap order contract ErgoTree is not configured".into(),
            ));
        }
        hex::decode(&self.swap_order_contract)
            .map_err(|e| Error::Config(format!("swap order contract is not hex: {e}")))?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_network(Network::Mainnet)
    }
}
