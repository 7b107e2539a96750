use std::fmt;

use thiserror::Error;

use crate::asset::{Amount, AssetId};

/// One unmet funding target reported by box selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub asset: AssetId,
    pub required: Amount,
    pub available: Amount,
}

impl Shortfall {
    /// How much more of `asset` the wallet would need.
    pub fn missing(&self) -> Amount {
        self.required.saturating_sub(self.available)
    }
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "need {} {}, have {}",
            self.required, self.asset, self.available
        )
    }
}

fn join_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("asset {asset} is not traded by pool {pool_id}")]
    InvalidAssetForPool { asset: AssetId, pool_id: String },

    #[error("trade too large for pool {pool_id}: no output for input {input}")]
    InsufficientLiquidity { pool_id: String, input: Amount },

    #[error("insufficient inputs: {}", join_shortfalls(.0))]
    InsufficientInputs(Vec<Shortfall>),

    #[error("cannot guarantee this trade's execution economics: {0}")]
    UnsatisfiableOrder(String),

    #[error("no viable route between {base} and {quote}")]
    NoViableRoute { base: AssetId, quote: AssetId },

    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),

    #[error("pool not found: {0}")]
    PoolNotFound(String),

    #[error("invalid pool: {0}")]
    InvalidPool(String),

    #[error("slippage must be at most 100% (got {0} bps)")]
    InvalidSlippage(u32),

    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("conservation check failed: {0}")]
    ConservationViolation(String),

    #[error("indexer error: {0}")]
    Indexer(String),

    #[error("node error: {0}")]
    Node(String),

    #[error("signer error: {0}")]
    Signer(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by [`SwapNode`](crate::node::SwapNode) async operations.
#[derive(Debug)]
pub enum NodeError {
    /// An engine operation failed.
    Engine(Error),
    /// A `spawn_blocking` task failed to join.
    Task(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Engine(e) => write!(f, "engine error: {e}"),
            NodeError::Task(e) => write!(f, "task join error: {e}"),
        }
    }
}

impl std::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NodeError::Engine(e) => Some(e),
            NodeError::Task(_) => None,
        }
    }
}

impl From<Error> for NodeError {
    fn from(e: Error) -> Self {
        NodeError::Engine(e)
    }
}
