//! `SwapNode`: async front for a [`SwapEngine`].
//!
//! Engine calls block on HTTP, so every method runs its engine call through
//! `tokio::task::spawn_blocking`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::amm_pool::pool::Pool;
use crate::asset::AssetId;
use crate::balance::Balance;
use crate::chain::{ErgoNodeBackend, ExplorerBackend, IndexerBackend, NodeBackend};
use crate::engine::{SwapEngine, SwapQuote, SwapRequest, SwapResult};
use crate::error::{Error, NodeError};
use crate::prover::Account;

// ── Struct ──────────────────────────────────────────────────────────────────

/// Shares one active engine across tasks.
pub struct SwapNode<I = ExplorerBackend, N = ErgoNodeBackend> {
    engine: Arc<SwapEngine<I, N>>,
}

impl<I, N> Clone for SwapNode<I, N> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<I, N> SwapNode<I, N>
where
    I: IndexerBackend + 'static,
    N: NodeBackend + 'static,
{
    pub fn new(engine: SwapEngine<I, N>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &Arc<SwapEngine<I, N>> {
        &self.engine
    }

    // ── spawn_blocking helper ───────────────────────────────────────────

    /// Run `f` against the engine on a blocking thread.
    pub async fn with_engine<F, R>(&self, f: F) -> Result<R, NodeError>
    where
        F: FnOnce(&SwapEngine<I, N>) -> Result<R, Error> + Send + 'static,
        R: Send + 'static,
    {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || f(&engine).map_err(NodeError::Engine))
            .await
            .map_err(|e| NodeError::Task(e.to_string()))?
    }

    // ── Operations ──────────────────────────────────────────────────────

    pub async fn balance(&self, address: String) -> Result<Balance, NodeError> {
        self.with_engine(move |engine| engine.balance(&address)).await
    }

    pub async fn quote(&self, request: SwapRequest) -> Result<SwapQuote, NodeError> {
        self.with_engine(move |engine| engine.quote(&request)).await
    }

    /// Quote, sign with `account` and submit.
    pub async fn swap(
        &self,
        request: SwapRequest,
        account: Arc<Account>,
        change_address: Option<String>,
    ) -> Result<SwapResult, NodeError> {
        self.with_engine(move |engine| {
            engine.swap(&request, &account, change_address.as_deref())
        })
        .await
    }

    pub async fn reload_pools(&self) -> Result<usize, NodeError> {
        self.with_engine(|engine| engine.reload_pools()).await
    }

    /// Cached pools trading `a` against `b`. Does not touch the network.
    pub fn pools_for_pair(&self, a: &AssetId, b: &AssetId) -> Vec<Pool> {
        self.engine.pools_for_pair(a, b)
    }

    // ── Background refresh ──────────────────────────────────────────────

    /// Reload the pool set every `every` until `shutdown` flips to `true`.
    ///
    /// A failed reload is logged and the previous snapshot stays in place.
    pub fn spawn_pool_refresher(
        &self,
        every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let node = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately; pools were just loaded.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match node.reload_pools().await {
                            Ok(n) => log::debug!("pool refresh: {n} pools"),
                            Err(e) => log::warn!("pool refresh failed: {e}"),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            log::debug!("pool refresher stopped");
        })
    }
}
