//! The swap engine.
//!
//! Construction is two-phase: [`EngineHandle::build`] only wires the config
//! and backends together, [`EngineHandle::activate`] validates the config and
//! loads the pool set, yielding a [`SwapEngine`]. Only an active engine
//! serves requests.

use serde::{Deserialize, Serialize};

use crate::amm_pool::math::Slippage;
use crate::amm_pool::pool::{Pool, PoolId};
use crate::amm_pool::registry::{PoolRegistry, fetch_pool};
use crate::asset::{Amount, AssetAmount, AssetId, ErgoBox, TxId};
use crate::assembly::{NetworkContext, OutputTrees, UnsignedTransaction, assemble_swap};
use crate::balance::{Balance, aggregate};
use crate::chain::{ErgoNodeBackend, ExplorerBackend, IndexerBackend, NodeBackend};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::order::{FundedOrder, SwapOrder, fund_order};
use crate::prover::Account;
use crate::router::route_best_order;
use crate::utxo::fetch_unspent_boxes;

// ── Requests & results ──────────────────────────────────────────────────

/// Sell `amount` base units of `base` for `quote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub base: AssetId,
    pub quote: AssetId,
    pub amount: Amount,
    pub slippage: Slippage,
    /// Restrict routing to this pool.
    #[serde(default)]
    pub pool_id: Option<PoolId>,
}

/// Priced order for a request, without any wallet involvement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub pool: Pool,
    pub order: SwapOrder,
}

/// Everything needed to sign a swap elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSwap {
    pub pool: Pool,
    pub funded: FundedOrder,
    pub context: NetworkContext,
    pub unsigned: UnsignedTransaction,
}

/// A submitted swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResult {
    pub tx_id: TxId,
    pub pool_id: PoolId,
    pub input: AssetAmount,
    pub min_output: AssetAmount,
    pub max_ex_fee: Amount,
}

// ── Construction ────────────────────────────────────────────────────────

/// An engine that has not loaded any chain state yet.
pub struct EngineHandle<I = ExplorerBackend, N = ErgoNodeBackend> {
    config: EngineConfig,
    indexer: I,
    node: N,
}

impl EngineHandle<ExplorerBackend, ErgoNodeBackend> {
    /// Wire up HTTP backends at the URLs in `config`.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let indexer = ExplorerBackend::new(&config.explorer_url, config.http_timeout())?;
        let node = ErgoNodeBackend::new(&config.node_url, config.http_timeout())?;
        Ok(Self::build(config, indexer, node))
    }
}

impl<I: IndexerBackend, N: NodeBackend> EngineHandle<I, N> {
    pub fn build(config: EngineConfig, indexer: I, node: N) -> Self {
        Self {
            config,
            indexer,
            node,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate the config and load every pool.
    pub fn activate(self) -> Result<SwapEngine<I, N>> {
        self.config.validate()?;
        let registry = PoolRegistry::load(&self.indexer, self.config.pool_page_size)?;
        log::info!(
            "{} engine active with {} pools",
            self.config.network,
            registry.snapshot().len()
        );
        Ok(SwapEngine {
            config: self.config,
            indexer: self.indexer,
            node: self.node,
            registry,
        })
    }
}

// ── Active engine ───────────────────────────────────────────────────────

pub struct SwapEngine<I = ExplorerBackend, N = ErgoNodeBackend> {
    config: EngineConfig,
    indexer: I,
    node: N,
    registry: PoolRegistry,
}

impl<I: IndexerBackend, N: NodeBackend> SwapEngine<I, N> {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn indexer(&self) -> &I {
        &self.indexer
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    /// Replace the pool snapshot with a fresh load.
    pub fn reload_pools(&self) -> Result<usize> {
        self.registry.reload(&self.indexer, self.config.pool_page_size)
    }

    pub fn pools_for_pair(&self, a: &AssetId, b: &AssetId) -> Vec<Pool> {
        self.registry.by_pair(a, b)
    }

    /// Live state of one pool straight from the indexer.
    pub fn live_pool(&self, id: &PoolId) -> Result<Pool> {
        fetch_pool(&self.indexer, id)?.ok_or_else(|| Error::PoolNotFound(id.to_hex()))
    }

    pub fn unspent_boxes(&self, address: &str) -> Result<Vec<ErgoBox>> {
        fetch_unspent_boxes(&self.indexer, address, self.config.utxo_page_size)
    }

    pub fn balance(&self, address: &str) -> Result<Balance> {
        aggregate(&self.unspent_boxes(address)?)
    }

    fn candidates(&self, request: &SwapRequest) -> Result<Vec<Pool>> {
        match &request.pool_id {
            Some(id) => {
                let pool = self
                    .registry
                    .by_id(id)
                    .ok_or_else(|| Error::PoolNotFound(id.to_hex()))?;
                if !pool.trades(&request.base, &request.quote) {
                    return Err(Error::InvalidAssetForPool {
                        asset: request.base,
                        pool_id: id.to_hex(),
                    });
                }
                Ok(vec![pool])
            }
            None => Ok(self.registry.by_pair(&request.base, &request.quote)),
        }
    }

    /// Price `request` against the best pool. No boxes are touched.
    pub fn quote(&self, request: &SwapRequest) -> Result<SwapQuote> {
        if request.amount == 0 {
            return Err(Error::InvalidAmount("swap amount must be positive".into()));
        }
        let pools = self.candidates(request)?;
        let (pool, order) = route_best_order(
            &pools,
            &request.base,
            &request.quote,
            request.amount,
            request.slippage,
            &self.config.fee_policy(),
        )?;
        log::debug!(
            "quote {} {} -> {} via {}: min {}",
            request.amount,
            request.base,
            request.quote,
            pool.id,
            order.extremes.min_output.amount
        );
        Ok(SwapQuote { pool, order })
    }

    /// Chain context for a request from `self_address`.
    pub fn network_context(
        &self,
        self_address: &str,
        change_address: Option<&str>,
    ) -> Result<NetworkContext> {
        Ok(NetworkContext {
            height: self.indexer.network_height()?,
            self_address: self_address.to_string(),
            change_address: change_address.unwrap_or(self_address).to_string(),
            miner_fee: self.config.miner_fee,
        })
    }

    /// Route, fund and assemble a swap for `self_address` without signing.
    pub fn prepare_swap(
        &self,
        request: &SwapRequest,
        self_address: &str,
        change_address: Option<&str>,
    ) -> Result<PreparedSwap> {
        let SwapQuote { pool, order } = self.quote(request)?;
        let boxes = self.unspent_boxes(self_address)?;
        let funded = fund_order(order, &boxes, self.config.min_box_value)?;
        let context = self.network_context(self_address, change_address)?;

        let redeemer = self.node.address_to_tree(&context.self_address)?;
        let change = if context.change_address == context.self_address {
            redeemer.clone()
        } else {
            self.node.address_to_tree(&context.change_address)?
        };
        let trees = OutputTrees {
            order_contract: self.config.swap_order_contract.clone(),
            redeemer,
            change,
        };
        let unsigned = assemble_swap(&funded, &context, &trees)?;
        Ok(PreparedSwap {
            pool,
            funded,
            context,
            unsigned,
        })
    }

    /// Full swap: prepare, sign with `account`, submit.
    pub fn swap(
        &self,
        request: &SwapRequest,
        account: &Account,
        change_address: Option<&str>,
    ) -> Result<SwapResult> {
        let prepared = self.prepare_swap(request, &account.address, change_address)?;
        let signed = account
            .prover
            .sign(&prepared.unsigned, &prepared.funded.selection.boxes)?;
        let tx_id = self.node.submit(&signed)?;

        let order = &prepared.funded.order;
        log::info!(
            "submitted swap {tx_id}: {} {} via pool {}",
            order.input.amount,
            order.input.id(),
            order.pool_id
        );
        Ok(SwapResult {
            tx_id,
            pool_id: order.pool_id,
            input: order.input,
            min_output: order.extremes.min_output,
            max_ex_fee: order.extremes.max_ex_fee,
        })
    }
}
