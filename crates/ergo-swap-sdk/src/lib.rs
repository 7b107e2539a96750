pub mod amm_pool;
pub mod assembly;
pub mod asset;
pub mod balance;
pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod network;
pub mod node;
pub mod order;
pub mod prover;
pub mod router;
pub mod selection;
pub mod sigma;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tokens;
pub mod units;
pub mod utxo;

// Core types
pub use asset::{
    Amount, Asset, AssetAmount, AssetId, BoxId, ERG_DECIMALS, ERG_SYMBOL, ErgoBox, TokenId, TxId,
};
pub use balance::{Balance, aggregate};
pub use config::EngineConfig;
pub use error::{Error, NodeError, Result, Shortfall};
pub use network::Network;
pub use units::{format_units, parse_units};

// Chain access
pub use chain::{ErgoNodeBackend, ExplorerBackend, IndexerBackend, NodeBackend};
pub use tokens::{TokenInfo, resolve_asset, symbol_of};
pub use utxo::fetch_unspent_boxes;

// AMM pools
pub use amm_pool::math::{Slippage, output_amount};
pub use amm_pool::parse::{parse_pool, parse_pool_box};
pub use amm_pool::pool::{Pool, PoolId, PoolKind, pool_display_name};
pub use amm_pool::registry::{PoolRegistry, PoolSnapshot, fetch_pool};

// Orders and transactions
pub use assembly::{
    NetworkContext, OutputTrees, SignedTransaction, UnsignedTransaction, assemble_swap,
    check_conservation,
};
pub use order::{FeePolicy, FundedOrder, Nitro, SwapExtremes, SwapOrder, build_order, fund_order};
pub use prover::{Account, NodeWalletProver, Prover};
pub use router::{route_best_order, route_best_price};
pub use selection::{Selection, select_boxes};

// Engine
pub use engine::{EngineHandle, PreparedSwap, SwapEngine, SwapQuote, SwapRequest, SwapResult};
pub use node::SwapNode;
