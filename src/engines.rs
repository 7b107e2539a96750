use std::collections::HashMap;

use anyhow::{Result, anyhow};
use ergo_swap_sdk::{
    EngineConfig, EngineHandle, ErgoNodeBackend, ExplorerBackend, IndexerBackend, Network,
    NodeBackend, SwapEngine, SwapNode,
};

/// Active engines, one per network, owned by the composition root.
pub struct EngineRegistry<I = ExplorerBackend, N = ErgoNodeBackend> {
    engines: HashMap<Network, SwapNode<I, N>>,
}

impl<I, N> Default for EngineRegistry<I, N> {
    fn default() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }
}

impl EngineRegistry<ExplorerBackend, ErgoNodeBackend> {
    /// Build and activate an HTTP-backed engine for `config.network`.
    ///
    /// Activation loads every pool over HTTP, so it runs on a blocking
    /// thread.
    pub async fn activate(&mut self, config: EngineConfig) -> Result<&SwapNode> {
        let network = config.network;
        let engine = tokio::task::spawn_blocking(move || {
            EngineHandle::from_config(config).and_then(|handle| handle.activate())
        })
        .await
        .map_err(|e| anyhow!("{network} activation task failed: {e}"))??;
        Ok(self.insert(network, engine))
    }
}

impl<I, N> EngineRegistry<I, N>
where
    I: IndexerBackend + 'static,
    N: NodeBackend + 'static,
{
    /// Register an active engine, replacing any previous one for `network`.
    pub fn insert(&mut self, network: Network, engine: SwapEngine<I, N>) -> &SwapNode<I, N> {
        if self.engines.contains_key(&network) {
            log::info!("replacing {network} engine");
        }
        self.engines.insert(network, SwapNode::new(engine));
        &self.engines[&network]
    }

    pub fn get(&self, network: Network) -> Result<&SwapNode<I, N>> {
        self.engines
            .get(&network)
            .ok_or_else(|| anyhow!("no active engine for {network}"))
    }

    pub fn remove(&mut self, network: Network) -> Option<SwapNode<I, N>> {
        self.engines.remove(&network)
    }

    pub fn networks(&self) -> Vec<Network> {
        Network::ALL
            .into_iter()
            .filter(|n| self.engines.contains_key(n))
            .collect()
    }
}
