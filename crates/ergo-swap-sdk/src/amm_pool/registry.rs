use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::parse::parse_pool;
use super::pool::{Pool, PoolId, PoolKind};
use crate::asset::{AssetId, ErgoBox};
use crate::chain::IndexerBackend;
use crate::error::{Error, Result};

/// Boxes requested when looking a single pool up by its NFT.
const POOL_LOOKUP_LIMIT: u32 = 10;

/// An immutable, complete set of pools as of one reload.
#[derive(Debug, Default)]
pub struct PoolSnapshot {
    pools: Vec<Pool>,
    by_id: HashMap<PoolId, usize>,
}

impl PoolSnapshot {
    /// Index `pools`. A pool id seen twice keeps its first occurrence.
    pub fn new(pools: Vec<Pool>) -> Self {
        let mut kept = Vec::with_capacity(pools.len());
        let mut by_id = HashMap::with_capacity(pools.len());
        for pool in pools {
            if by_id.contains_key(&pool.id) {
                log::warn!("duplicate pool {} in snapshot, keeping first", pool.id);
                continue;
            }
            by_id.insert(pool.id, kept.len());
            kept.push(pool);
        }
        Self { pools: kept, by_id }
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn get(&self, id: &PoolId) -> Option<&Pool> {
        self.by_id.get(id).map(|&i| &self.pools[i])
    }

    /// Pools trading the unordered pair `(a, b)`, in load order.
    pub fn for_pair(&self, a: &AssetId, b: &AssetId) -> Vec<&Pool> {
        self.pools.iter().filter(|p| p.trades(a, b)).collect()
    }
}

/// Shared pool set.
///
/// A reload builds a complete new [`PoolSnapshot`] and swaps it in with a
/// single write; readers clone the `Arc` and keep a consistent view for as
/// long as they hold it.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    snapshot: RwLock<Arc<PoolSnapshot>>,
}

impl PoolRegistry {
    pub fn from_pools(pools: Vec<Pool>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(PoolSnapshot::new(pools))),
        }
    }

    /// Load every pool of every kind from `backend`.
    pub fn load<B: IndexerBackend + ?Sized>(backend: &B, page_size: u32) -> Result<Self> {
        Ok(Self::from_pools(load_all_pools(backend, page_size)?))
    }

    /// Replace the current snapshot with a freshly loaded one.
    ///
    /// On error the previous snapshot stays in place.
    pub fn reload<B: IndexerBackend + ?Sized>(&self, backend: &B, page_size: u32) -> Result<usize> {
        let fresh = Arc::new(PoolSnapshot::new(load_all_pools(backend, page_size)?));
        let count = fresh.len();
        // Swapping an Arc cannot leave the lock's contents half-written, so a
        // poisoned lock still holds a valid snapshot.
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        log::info!("pool registry reloaded: {count} pools");
        Ok(count)
    }

    pub fn snapshot(&self) -> Arc<PoolSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn by_id(&self, id: &PoolId) -> Option<Pool> {
        self.snapshot().get(id).cloned()
    }

    pub fn by_pair(&self, a: &AssetId, b: &AssetId) -> Vec<Pool> {
        self.snapshot().for_pair(a, b).into_iter().cloned().collect()
    }
}

fn decode_or_skip(kind: PoolKind, ergo_box: &ErgoBox) -> Option<Pool> {
    match parse_pool(kind, ergo_box) {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("skipping {kind} pool box {}: {e}", ergo_box.box_id);
            None
        }
    }
}

/// One page of `kind` pools.
///
/// Returns the decoded pools and the number of boxes the indexer returned;
/// undecodable boxes are skipped but still count toward the page.
pub fn fetch_pool_page<B: IndexerBackend + ?Sized>(
    backend: &B,
    kind: PoolKind,
    offset: u32,
    limit: u32,
) -> Result<(Vec<Pool>, usize)> {
    let boxes = backend.unspent_boxes_by_ergo_tree(kind.ergo_tree(), offset, limit)?;
    let pools = boxes.iter().filter_map(|b| decode_or_skip(kind, b)).collect();
    Ok((pools, boxes.len()))
}

/// Current state of a single pool, looked up by its NFT.
pub fn fetch_pool<B: IndexerBackend + ?Sized>(backend: &B, id: &PoolId) -> Result<Option<Pool>> {
    let nft = AssetId::Token(*id);
    let boxes = backend.unspent_boxes_by_token_id(id, 0, POOL_LOOKUP_LIMIT)?;
    for b in &boxes {
        let Some(kind) = PoolKind::from_ergo_tree(&b.ergo_tree) else {
            continue;
        };
        if b.assets.first().map(|a| a.id()) == Some(nft) {
            return parse_pool(kind, b).map(Some);
        }
    }
    Ok(None)
}

fn load_all_pools<B: IndexerBackend + ?Sized>(backend: &B, page_size: u32) -> Result<Vec<Pool>> {
    if page_size == 0 {
        return Err(Error::Config("pool page size must be positive".into()));
    }
    let mut pools = Vec::new();
    for kind in PoolKind::ALL {
        let mut offset = 0u32;
        loop {
            let (page, fetched) = fetch_pool_page(backend, kind, offset, page_size)?;
            pools.extend(page);
            if fetched < page_size as usize {
                break;
            }
            offset = offset
                .checked_add(page_size)
                .ok_or(Error::Overflow("pool page offset"))?;
        }
        log::debug!("loaded {kind} pools, {} total so far", pools.len());
    }
    Ok(pools)
}
