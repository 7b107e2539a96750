//! Fixtures and in-memory backends for exercising the engine without a
//! network.
//!
//! Box and token ids are derived from a one-byte seed so tests can refer to
//! them by number.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::amm_pool::parse::LP_TOTAL_EMISSION;
use crate::amm_pool::pool::{Pool, PoolKind};
use crate::asset::{Amount, Asset, AssetAmount, BoxId, ErgoBox, TokenId, TxId};
use crate::assembly::{SignedTransaction, UnsignedTransaction};
use crate::chain::{IndexerBackend, NodeBackend};
use crate::config::DEFAULT_MIN_BOX_VALUE;
use crate::error::{Error, Result};
use crate::prover::Prover;
use crate::sigma;
use crate::tokens::TokenInfo;

/// Id returned by [`MockProver`] signatures and [`MockNode`] submissions.
pub const MOCK_TX_ID: TxId = TxId::from_bytes([0x5a; 32]);

// ── Fixtures ────────────────────────────────────────────────────────────────

pub fn token_id(seed: u8) -> TokenId {
    TokenId::from_bytes([seed; 32])
}

fn lp_token_id(seed: u8) -> TokenId {
    let mut bytes = [seed; 32];
    bytes[0] = 0x1f;
    TokenId::from_bytes(bytes)
}

/// A box carrying only `value` nanoERG.
pub fn erg_box(seed: u8, value: Amount) -> ErgoBox {
    ErgoBox {
        box_id: BoxId::from_bytes([seed; 32]),
        value,
        ergo_tree: format!("0008cd02{}", hex::encode([seed; 32])),
        assets: Vec::new(),
        creation_height: 1,
        transaction_id: TxId::from_bytes([seed; 32]),
        index: 0,
        spent_transaction_id: None,
        inclusion_height: 1,
        global_index: u64::from(seed),
        additional_registers: BTreeMap::new(),
    }
}

/// A box carrying `value` nanoERG and the given tokens (zero decimals).
pub fn token_box(seed: u8, value: Amount, tokens: &[(TokenId, Amount)]) -> ErgoBox {
    let mut b = erg_box(seed, value);
    b.assets = tokens
        .iter()
        .map(|&(id, amount)| AssetAmount::new(Asset::token(id, 0), amount))
        .collect();
    b
}

fn pool(seed: u8, kind: PoolKind, x: AssetAmount, y: AssetAmount) -> Pool {
    Pool {
        id: token_id(seed),
        box_id: BoxId::from_bytes([seed; 32]),
        kind,
        lp: AssetAmount::new(Asset::token(lp_token_id(seed), 0), 1_000_000),
        x,
        y,
        fee_num: 997,
        fee_denom: 1000,
    }
}

/// ERG/`token` pool with a 0.3% fee. The pool id is `token_id(seed)`.
pub fn n2t_pool(seed: u8, erg: Amount, token: TokenId, token_amount: Amount) -> Pool {
    pool(
        seed,
        PoolKind::N2T,
        AssetAmount::native(erg),
        AssetAmount::new(Asset::token(token, 0), token_amount),
    )
}

/// `x`/`y` pool with a 0.3% fee. The pool id is `token_id(seed)`.
pub fn t2t_pool(seed: u8, x: TokenId, x_amount: Amount, y: TokenId, y_amount: Amount) -> Pool {
    pool(
        seed,
        PoolKind::T2T,
        AssetAmount::new(Asset::token(x, 0), x_amount),
        AssetAmount::new(Asset::token(y, 0), y_amount),
    )
}

/// The on-chain box a pool decodes from.
pub fn pool_to_box(pool: &Pool) -> ErgoBox {
    let seed = pool.box_id.as_bytes()[0];
    let mut b = erg_box(seed, DEFAULT_MIN_BOX_VALUE);
    b.box_id = pool.box_id;
    b.ergo_tree = pool.kind.ergo_tree().to_string();
    b.assets = vec![
        AssetAmount::new(Asset::token(pool.id, 0), 1),
        pool.lp.with_amount(LP_TOTAL_EMISSION - pool.lp.amount),
    ];
    match pool.kind {
        PoolKind::N2T => b.value = pool.x.amount,
        PoolKind::T2T => b.assets.push(pool.x),
    }
    b.assets.push(pool.y);
    let fee = i32::try_from(pool.fee_num).expect("fee fits an Int");
    b.additional_registers
        .insert("R4".into(), sigma::encode_int(fee));
    b
}

fn page(boxes: impl Iterator<Item = ErgoBox>, offset: u32, limit: u32) -> Vec<ErgoBox> {
    boxes.skip(offset as usize).take(limit as usize).collect()
}

// ── MockIndexer ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct IndexerState {
    pool_boxes: Vec<ErgoBox>,
    boxes: HashMap<String, Vec<ErgoBox>>,
    tokens: Vec<TokenInfo>,
    height: u32,
    fail_next: Option<String>,
    pool_page_requests: usize,
    box_page_requests: usize,
}

/// In-memory indexer with offset/limit paging.
#[derive(Default)]
pub struct MockIndexer {
    state: Mutex<IndexerState>,
}

impl MockIndexer {
    fn with_state<R>(&self, f: impl FnOnce(&mut IndexerState) -> Result<R>) -> Result<R> {
        let mut state = self.state.lock().expect("mock indexer lock");
        if let Some(msg) = state.fail_next.take() {
            return Err(Error::Indexer(msg));
        }
        f(&mut state)
    }

    /// Replace the pool set with the boxes `pools` decode from.
    pub fn set_pools(&self, pools: Vec<Pool>) {
        self.state.lock().expect("mock indexer lock").pool_boxes =
            pools.iter().map(pool_to_box).collect();
    }

    /// Put a raw box into the pool box list at `index`.
    pub fn insert_pool_box(&self, index: usize, ergo_box: ErgoBox) {
        self.state
            .lock()
            .expect("mock indexer lock")
            .pool_boxes
            .insert(index, ergo_box);
    }

    pub fn set_boxes(&self, address: &str, boxes: Vec<ErgoBox>) {
        self.state
            .lock()
            .expect("mock indexer lock")
            .boxes
            .insert(address.to_string(), boxes);
    }

    pub fn add_token(&self, info: TokenInfo) {
        self.state.lock().expect("mock indexer lock").tokens.push(info);
    }

    pub fn set_height(&self, height: u32) {
        self.state.lock().expect("mock indexer lock").height = height;
    }

    /// Make the next call of any kind fail with `Error::Indexer(msg)`.
    pub fn fail_next(&self, msg: &str) {
        self.state.lock().expect("mock indexer lock").fail_next = Some(msg.to_string());
    }

    /// Number of pool pages requested so far.
    pub fn pool_page_requests(&self) -> usize {
        self.state.lock().expect("mock indexer lock").pool_page_requests
    }

    /// Number of address box pages requested so far.
    pub fn box_page_requests(&self) -> usize {
        self.state.lock().expect("mock indexer lock").box_page_requests
    }
}

impl IndexerBackend for MockIndexer {
    fn unspent_boxes_by_address(
        &self,
        address: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ErgoBox>> {
        self.with_state(|s| {
            s.box_page_requests += 1;
            let boxes = s.boxes.get(address).cloned().unwrap_or_default();
            Ok(page(boxes.into_iter(), offset, limit))
        })
    }

    fn unspent_boxes_by_ergo_tree(
        &self,
        ergo_tree: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ErgoBox>> {
        self.with_state(|s| {
            s.pool_page_requests += 1;
            let matching = s
                .pool_boxes
                .iter()
                .filter(|b| b.ergo_tree.eq_ignore_ascii_case(ergo_tree))
                .cloned();
            Ok(page(matching, offset, limit))
        })
    }

    fn unspent_boxes_by_token_id(
        &self,
        token: &TokenId,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ErgoBox>> {
        self.with_state(|s| {
            let holds = |b: &&ErgoBox| b.assets.iter().any(|a| a.asset.id.token() == Some(token));
            let matching = s
                .pool_boxes
                .iter()
                .chain(s.boxes.values().flatten())
                .filter(holds)
                .cloned();
            Ok(page(matching, offset, limit))
        })
    }

    fn network_height(&self) -> Result<u32> {
        self.with_state(|s| Ok(s.height))
    }

    fn token_info(&self, id: &TokenId) -> Result<TokenInfo> {
        self.with_state(|s| {
            s.tokens
                .iter()
                .find(|t| t.id == *id)
                .cloned()
                .ok_or_else(|| Error::Indexer(format!("token {id} not found")))
        })
    }

    fn search_tokens(&self, query: &str) -> Result<Vec<TokenInfo>> {
        let needle = query.to_lowercase();
        self.with_state(|s| {
            Ok(s.tokens
                .iter()
                .filter(|t| t.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        })
    }
}

// ── MockNode ────────────────────────────────────────────────────────────────

/// Node double that records submissions.
#[derive(Default)]
pub struct MockNode {
    submitted: Mutex<Vec<SignedTransaction>>,
    reject_with: Mutex<Option<String>>,
}

impl MockNode {
    /// Reject every further submission with `reason`.
    pub fn reject_with(&self, reason: &str) {
        *self.reject_with.lock().expect("mock node lock") = Some(reason.to_string());
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().expect("mock node lock").clone()
    }

    /// The tree [`MockNode::address_to_tree`] maps `address` to.
    pub fn tree_of(address: &str) -> String {
        format!("0008cd{}", hex::encode(address))
    }
}

impl NodeBackend for MockNode {
    fn submit(&self, tx: &SignedTransaction) -> Result<TxId> {
        if let Some(reason) = self.reject_with.lock().expect("mock node lock").clone() {
            return Err(Error::SubmissionFailed(reason));
        }
        self.submitted.lock().expect("mock node lock").push(tx.clone());
        Ok(tx.id.unwrap_or(MOCK_TX_ID))
    }

    fn address_to_tree(&self, address: &str) -> Result<String> {
        Ok(Self::tree_of(address))
    }
}

// ── MockProver ──────────────────────────────────────────────────────────────

/// Prover that "signs" by serializing the transaction and stamping
/// [`MOCK_TX_ID`] on it.
#[derive(Default)]
pub struct MockProver;

impl Prover for MockProver {
    fn sign(&self, tx: &UnsignedTransaction, _inputs: &[ErgoBox]) -> Result<SignedTransaction> {
        let mut json = serde_json::to_value(tx).map_err(|e| Error::Signer(e.to_string()))?;
        json["id"] = serde_json::Value::String(MOCK_TX_ID.to_hex());
        let bytes = serde_json::to_vec(&json).map_err(|e| Error::Signer(e.to_string()))?;
        SignedTransaction::from_json_bytes(bytes)
    }
}
