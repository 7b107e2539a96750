use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::asset::{Amount, Asset, AssetAmount, BoxId, ErgoBox, TokenId, TxId};
use crate::assembly::SignedTransaction;
use crate::error::{Error, Result};
use crate::tokens::TokenInfo;

/// Read access to the chain through an indexer.
///
/// All calls are blocking; wrap them in `spawn_blocking` from async code.
pub trait IndexerBackend: Send + Sync {
    /// One page of unspent boxes owned by `address`, in indexer order.
    fn unspent_boxes_by_address(
        &self,
        address: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ErgoBox>>;

    /// One page of unspent boxes locked by `ergo_tree` (hex).
    fn unspent_boxes_by_ergo_tree(
        &self,
        ergo_tree: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ErgoBox>>;

    /// Unspent boxes holding `token`.
    fn unspent_boxes_by_token_id(
        &self,
        token: &TokenId,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ErgoBox>>;

    /// Height of the best block.
    fn network_height(&self) -> Result<u32>;

    fn token_info(&self, id: &TokenId) -> Result<TokenInfo>;

    fn search_tokens(&self, query: &str) -> Result<Vec<TokenInfo>>;
}

/// Write access to the chain through a full node.
pub trait NodeBackend: Send + Sync {
    /// Submit a signed transaction. A rejection is returned verbatim as
    /// [`Error::SubmissionFailed`].
    fn submit(&self, tx: &SignedTransaction) -> Result<TxId>;

    /// Hex ErgoTree of a P2PK or P2S address.
    fn address_to_tree(&self, address: &str) -> Result<String>;
}

fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("http client: {e}")))
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

// ── Explorer ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Items<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerAsset {
    token_id: TokenId,
    amount: u64,
    #[serde(default)]
    decimals: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerRegister {
    serialized_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerBox {
    box_id: BoxId,
    transaction_id: TxId,
    value: u64,
    index: u16,
    #[serde(default)]
    global_index: u64,
    creation_height: u32,
    #[serde(default)]
    settlement_height: u32,
    ergo_tree: String,
    #[serde(default)]
    assets: Vec<ExplorerAsset>,
    #[serde(default)]
    additional_registers: BTreeMap<String, ExplorerRegister>,
    #[serde(default)]
    spent_transaction_id: Option<TxId>,
}

impl From<ExplorerBox> for ErgoBox {
    fn from(b: ExplorerBox) -> Self {
        ErgoBox {
            box_id: b.box_id,
            value: Amount::from(b.value),
            ergo_tree: b.ergo_tree,
            assets: b
                .assets
                .into_iter()
                .map(|a| {
                    AssetAmount::new(
                        Asset::token(a.token_id, a.decimals.unwrap_or(0)),
                        Amount::from(a.amount),
                    )
                })
                .collect(),
            creation_height: b.creation_height,
            transaction_id: b.transaction_id,
            index: b.index,
            spent_transaction_id: b.spent_transaction_id,
            inclusion_height: b.settlement_height,
            global_index: b.global_index,
            additional_registers: b
                .additional_registers
                .into_iter()
                .map(|(k, v)| (k, v.serialized_value))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NetworkState {
    height: u32,
}

#[derive(Debug, Deserialize)]
struct ExplorerToken {
    id: TokenId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    decimals: Option<u8>,
}

impl From<ExplorerToken> for TokenInfo {
    fn from(t: ExplorerToken) -> Self {
        TokenInfo {
            id: t.id,
            name: t.name.unwrap_or_default(),
            decimals: t.decimals.unwrap_or(0),
        }
    }
}

/// Indexer backed by the Ergo explorer v1 REST API.
pub struct ExplorerBackend {
    base_url: String,
    client: Client,
}

impl ExplorerBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: trim_base(base_url),
            client: http_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/api/v1{path}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| Error::Indexer(format!("GET {path}: {e}")))?;
        let resp = ensure_success(resp, "GET", path).map_err(Error::Indexer)?;
        resp.json::<T>()
            .map_err(|e| Error::Decode(format!("GET {path}: {e}")))
    }

    fn box_page(&self, path: &str, offset: u32, limit: u32) -> Result<Vec<ErgoBox>> {
        let page: Items<ExplorerBox> = self.get(
            path,
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )?;
        Ok(page.items.into_iter().map(ErgoBox::from).collect())
    }
}

fn ensure_success(resp: Response, method: &str, path: &str) -> std::result::Result<Response, String> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(format!("{method} {path}: HTTP {status}: {body}"))
}

impl IndexerBackend for ExplorerBackend {
    fn unspent_boxes_by_address(
        &self,
        address: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ErgoBox>> {
        self.box_page(&format!("/boxes/unspent/byAddress/{address}"), offset, limit)
    }

    fn unspent_boxes_by_ergo_tree(
        &self,
        ergo_tree: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ErgoBox>> {
        self.box_page(&format!("/boxes/unspent/byErgoTree/{ergo_tree}"), offset, limit)
    }

    fn unspent_boxes_by_token_id(
        &self,
        token: &TokenId,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ErgoBox>> {
        self.box_page(&format!("/boxes/unspent/byTokenId/{token}"), offset, limit)
    }

    fn network_height(&self) -> Result<u32> {
        let state: NetworkState = self.get("/networkState", &[])?;
        Ok(state.height)
    }

    fn token_info(&self, id: &TokenId) -> Result<TokenInfo> {
        let token: ExplorerToken = self.get(&format!("/tokens/{id}"), &[])?;
        Ok(token.into())
    }

    fn search_tokens(&self, query: &str) -> Result<Vec<TokenInfo>> {
        let page: Items<ExplorerToken> =
            self.get("/tokens/search", &[("query", query.to_string())])?;
        Ok(page.items.into_iter().map(TokenInfo::from).collect())
    }
}

// ── Node ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AddressTree {
    tree: String,
}

/// Node backed by the Ergo node REST API.
pub struct ErgoNodeBackend {
    base_url: String,
    client: Client,
}

impl ErgoNodeBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: trim_base(base_url),
            client: http_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl NodeBackend for ErgoNodeBackend {
    fn submit(&self, tx: &SignedTransaction) -> Result<TxId> {
        let url = format!("{}/transactions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(tx.bytes.clone())
            .send()
            .map_err(|e| Error::Node(format!("POST /transactions: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| Error::Node(format!("POST /transactions: {e}")))?;
        if !status.is_success() {
            return Err(Error::SubmissionFailed(body));
        }
        let id: String = serde_json::from_str(&body)
            .map_err(|e| Error::Decode(format!("submit response {body:?}: {e}")))?;
        let tx_id: TxId = id.parse()?;
        if let Some(expected) = tx.id {
            if expected != tx_id {
                log::warn!("node accepted {tx_id}, signer reported {expected}");
            }
        }
        Ok(tx_id)
    }

    fn address_to_tree(&self, address: &str) -> Result<String> {
        let path = format!("/script/addressToTree/{address}");
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .map_err(|e| Error::Node(format!("GET {path}: {e}")))?;
        let resp = ensure_success(resp, "GET", &path).map_err(Error::Node)?;
        let tree: AddressTree = resp
            .json()
            .map_err(|e| Error::Decode(format!("GET {path}: {e}")))?;
        Ok(tree.tree)
    }
}
