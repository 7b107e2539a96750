//! CLI operations over an active engine.
//!
//! User input (asset symbols, decimal amounts) is resolved here; the engine
//! only ever sees base units.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use ergo_swap_sdk::{
    Account, Amount, AssetAmount, AssetId, ERG_DECIMALS, IndexerBackend, NodeBackend,
    Pool, PoolId, PoolKind, Slippage, SwapEngine, SwapNode, SwapRequest, TokenId, TxId, format_units,
    parse_units, pool_display_name, resolve_asset, symbol_of,
};
use serde::Serialize;

// ============================================================================
// Labels
// ============================================================================

fn short_hex(id: &AssetId) -> String {
    let s = id.to_string();
    s.chars().take(8).collect()
}

fn display_symbol<I: IndexerBackend>(indexer: &I, id: &AssetId) -> String {
    symbol_of(indexer, id).unwrap_or_else(|| short_hex(id))
}

/// Symbol and decimals of a held token, from one metadata lookup.
fn token_display<I: IndexerBackend>(
    indexer: &I,
    token: &TokenId,
) -> ergo_swap_sdk::Result<(String, u8)> {
    let info = indexer.token_info(token)?;
    let symbol = if info.name.is_empty() {
        short_hex(&AssetId::Token(*token))
    } else {
        info.name
    };
    Ok((symbol, info.decimals))
}

fn asset_amount_label<I: IndexerBackend>(indexer: &I, a: &AssetAmount) -> String {
    let value = format_units(a.amount, a.asset.decimals).unwrap_or_else(|_| a.amount.to_string());
    format!("{value} {}", display_symbol(indexer, &a.id()))
}

fn erg_label(amount: Amount) -> String {
    let value = format_units(amount, ERG_DECIMALS).unwrap_or_else(|_| amount.to_string());
    format!("{value} ERG")
}

/// Pool fee as a percentage, e.g. `997/1000` is `0.3%`.
fn fee_label(pool: &Pool) -> String {
    let bps = Amount::from(pool.fee_denom - pool.fee_num) * 10_000 / Amount::from(pool.fee_denom);
    format!("{}%", format_units(bps, 2).unwrap_or_else(|_| bps.to_string()))
}

// ============================================================================
// Balance
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceLine {
    pub asset: String,
    pub amount: String,
}

pub async fn balance<I, N>(node: &SwapNode<I, N>, address: String) -> Result<Vec<BalanceLine>>
where
    I: IndexerBackend + 'static,
    N: NodeBackend + 'static,
{
    let lines = node
        .with_engine(move |engine| {
            let balance = engine.balance(&address)?;
            let indexer = engine.indexer();
            let mut lines = vec![BalanceLine {
                asset: "ERG".into(),
                amount: format_units(balance.native, ERG_DECIMALS)?,
            }];
            for (token, amount) in &balance.tokens {
                let (symbol, decimals) = token_display(indexer, token)?;
                lines.push(BalanceLine {
                    asset: symbol,
                    amount: format_units(*amount, decimals)?,
                });
            }
            Ok(lines)
        })
        .await?;
    Ok(lines)
}

// ============================================================================
// Pools
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolLine {
    pub id: PoolId,
    pub name: String,
    pub kind: PoolKind,
    pub x: String,
    pub y: String,
    pub fee: String,
}

impl fmt::Display for PoolLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {:<20} {}  {} / {}  fee {}",
            self.id, self.name, self.kind, self.x, self.y, self.fee
        )
    }
}

/// Cached pools, optionally only those trading `pair`.
pub async fn pools<I, N>(
    node: &SwapNode<I, N>,
    pair: Option<(String, String)>,
) -> Result<Vec<PoolLine>>
where
    I: IndexerBackend + 'static,
    N: NodeBackend + 'static,
{
    let lines = node
        .with_engine(move |engine| {
            let indexer = engine.indexer();
            let pools = match &pair {
                Some((a, b)) => {
                    let a = resolve_asset(indexer, a)?;
                    let b = resolve_asset(indexer, b)?;
                    engine.pools_for_pair(&a.id, &b.id)
                }
                None => engine.registry().snapshot().pools().to_vec(),
            };
            Ok(pools
                .iter()
                .map(|pool| PoolLine {
                    id: pool.id,
                    name: pool_display_name(pool, |id| symbol_of(indexer, id)),
                    kind: pool.kind,
                    x: asset_amount_label(indexer, &pool.x),
                    y: asset_amount_label(indexer, &pool.y),
                    fee: fee_label(pool),
                })
                .collect())
        })
        .await?;
    Ok(lines)
}

// ============================================================================
// Quote & swap
// ============================================================================

/// A swap as typed by the user.
#[derive(Debug, Clone)]
pub struct SwapArgs {
    /// Asset sold: `ERG`, a token id, or a token name.
    pub base: String,
    /// Asset bought.
    pub quote: String,
    /// Decimal amount of `base`.
    pub amount: String,
    pub slippage: Slippage,
    pub pool_id: Option<PoolId>,
}

fn resolve_request<I: IndexerBackend>(
    indexer: &I,
    args: &SwapArgs,
) -> ergo_swap_sdk::Result<SwapRequest> {
    let base = resolve_asset(indexer, &args.base)?;
    let quote = resolve_asset(indexer, &args.quote)?;
    let amount = parse_units(&args.amount, base.decimals)?;
    Ok(SwapRequest {
        base: base.id,
        quote: quote.id,
        amount,
        slippage: args.slippage,
        pool_id: args.pool_id,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteReport {
    pub pool_id: PoolId,
    pub pool: String,
    pub input: String,
    pub expected_output: String,
    pub min_output: String,
    pub max_ex_fee: String,
    pub miner_fee: String,
}

impl fmt::Display for QuoteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pool:            {} ({})", self.pool, self.pool_id)?;
        writeln!(f, "sell:            {}", self.input)?;
        writeln!(f, "expected output: {}", self.expected_output)?;
        writeln!(f, "minimum output:  {}", self.min_output)?;
        writeln!(f, "max ex. fee:     {}", self.max_ex_fee)?;
        write!(f, "miner fee:       {}", self.miner_fee)
    }
}

fn quote_report<I: IndexerBackend, N: NodeBackend>(
    engine: &SwapEngine<I, N>,
    args: &SwapArgs,
) -> ergo_swap_sdk::Result<QuoteReport> {
    let indexer = engine.indexer();
    let request = resolve_request(indexer, args)?;
    let quote = engine.quote(&request)?;
    let order = &quote.order;
    Ok(QuoteReport {
        pool_id: quote.pool.id,
        pool: pool_display_name(&quote.pool, |id| symbol_of(indexer, id)),
        input: asset_amount_label(indexer, &order.input),
        expected_output: asset_amount_label(indexer, &order.expected_output),
        min_output: asset_amount_label(indexer, &order.extremes.min_output),
        max_ex_fee: erg_label(order.extremes.max_ex_fee),
        miner_fee: erg_label(order.miner_fee),
    })
}

pub async fn quote<I, N>(node: &SwapNode<I, N>, args: SwapArgs) -> Result<QuoteReport>
where
    I: IndexerBackend + 'static,
    N: NodeBackend + 'static,
{
    Ok(node.with_engine(move |engine| quote_report(engine, &args)).await?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapReport {
    pub tx_id: TxId,
    pub pool_id: PoolId,
    pub input: String,
    pub min_output: String,
    pub max_ex_fee: String,
}

impl fmt::Display for SwapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "submitted {}", self.tx_id)?;
        writeln!(f, "pool:           {}", self.pool_id)?;
        writeln!(f, "sold:           {}", self.input)?;
        writeln!(f, "minimum output: {}", self.min_output)?;
        write!(f, "max fee:        {}", self.max_ex_fee)
    }
}

/// Resolve `args`, then quote, fund, sign with `account` and submit.
pub async fn swap<I, N>(
    node: &SwapNode<I, N>,
    args: SwapArgs,
    account: Arc<Account>,
    change_address: Option<String>,
) -> Result<SwapReport>
where
    I: IndexerBackend + 'static,
    N: NodeBackend + 'static,
{
    let report = node
        .with_engine(move |engine| {
            let indexer = engine.indexer();
            let request = resolve_request(indexer, &args)?;
            let result = engine.swap(&request, &account, change_address.as_deref())?;
            Ok(SwapReport {
                tx_id: result.tx_id,
                pool_id: result.pool_id,
                input: asset_amount_label(indexer, &result.input),
                min_output: asset_amount_label(indexer, &result.min_output),
                max_ex_fee: erg_label(result.max_ex_fee),
            })
        })
        .await?;
    Ok(report)
}
