//! Best-price routing across pools trading the same pair.
//!
//! Several pools may list the same two assets with different depth and fees.
//! The router prices the trade against every candidate and keeps the one that
//! returns the most; the first candidate wins a tie.

use crate::amm_pool::math::{Slippage, output_amount};
use crate::amm_pool::pool::Pool;
use crate::asset::{Amount, AssetAmount, AssetId};
use crate::error::{Error, Result};
use crate::order::{FeePolicy, SwapOrder, build_order};

// ── Candidate helpers ───────────────────────────────────────────────────

fn input_for(pool: &Pool, base: &AssetId, amount: Amount) -> Result<AssetAmount> {
    let asset = pool.asset(base).ok_or_else(|| Error::InvalidAssetForPool {
        asset: *base,
        pool_id: pool.id.to_hex(),
    })?;
    Ok(AssetAmount::new(asset, amount))
}

fn candidates<'a>(
    pools: &'a [Pool],
    base: &'a AssetId,
    quote: &'a AssetId,
) -> impl Iterator<Item = &'a Pool> + 'a {
    pools.iter().filter(move |p| p.trades(base, quote))
}

// ── Routing ─────────────────────────────────────────────────────────────

/// Pool giving the greatest expected output for `amount` of `base`.
///
/// Pools that cannot fill the trade are skipped. Fails with
/// [`Error::NoViableRoute`] when no pool for the pair can.
pub fn route_best_price(
    pools: &[Pool],
    base: &AssetId,
    quote: &AssetId,
    amount: Amount,
    slippage: Slippage,
) -> Result<(Pool, AssetAmount)> {
    let mut best: Option<(&Pool, AssetAmount)> = None;
    for pool in candidates(pools, base, quote) {
        let input = input_for(pool, base, amount)?;
        let output = match output_amount(pool, &input, slippage) {
            Ok(output) => output,
            Err(Error::InsufficientLiquidity { .. }) => {
                log::debug!("pool {} cannot fill {amount} {base}", pool.id);
                continue;
            }
            Err(e) => return Err(e),
        };
        if best.as_ref().is_none_or(|(_, b)| output.amount > b.amount) {
            best = Some((pool, output));
        }
    }
    best.map(|(pool, output)| (pool.clone(), output))
        .ok_or(Error::NoViableRoute {
            base: *base,
            quote: *quote,
        })
}

/// Build an order against every pool for the pair and keep the one with the
/// greatest guaranteed (minimum) output.
///
/// Pools that lack liquidity or cannot carry the order's fee economics are
/// skipped.
pub fn route_best_order(
    pools: &[Pool],
    base: &AssetId,
    quote: &AssetId,
    amount: Amount,
    slippage: Slippage,
    fees: &FeePolicy,
) -> Result<(Pool, SwapOrder)> {
    let mut best: Option<(&Pool, SwapOrder)> = None;
    for pool in candidates(pools, base, quote) {
        let input = input_for(pool, base, amount)?;
        let order = match build_order(
            pool,
            &input,
            slippage,
            fees.miner_fee,
            fees.fee_budget_multiplier,
            fees.min_nitro,
        ) {
            Ok(order) => order,
            Err(e @ (Error::InsufficientLiquidity { .. } | Error::UnsatisfiableOrder(_))) => {
                log::debug!("skipping pool {}: {e}", pool.id);
                continue;
            }
            Err(e) => return Err(e),
        };
        let better = best.as_ref().is_none_or(|(_, b)| {
            order.extremes.min_output.amount > b.extremes.min_output.amount
        });
        if better {
            best = Some((pool, order));
        }
    }
    best.map(|(pool, order)| (pool.clone(), order))
        .ok_or(Error::NoViableRoute {
            base: *base,
            quote: *quote,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Nitro;
    use crate::testing::{n2t_pool, token_id};

    fn erg_to_token() -> (AssetId, AssetId) {
        (AssetId::Native, AssetId::Token(token_id(0xaa)))
    }

    /// Pools with output 10, 15 and 12 for an input of 1_000_000 nanoERG at
    /// zero slippage: `y * 997_000 / (x + 997_000)` with `x = 997_000`
    /// halves `y`.
    fn pools_10_15_12() -> Vec<Pool> {
        vec![
            n2t_pool(1, 997_000, token_id(0xaa), 20),
            n2t_pool(2, 997_000, token_id(0xaa), 30),
            n2t_pool(3, 997_000, token_id(0xaa), 24),
        ]
    }

    #[test]
    fn picks_greatest_output() {
        let (base, quote) = erg_to_token();
        let (pool, out) =
            route_best_price(&pools_10_15_12(), &base, &quote, 1_000_000, Slippage::ZERO).unwrap();
        assert_eq!(pool.id, token_id(2));
        assert_eq!(out.amount, 15);
    }

    #[test]
    fn pair_is_unordered() {
        let (base, quote) = erg_to_token();
        let pools = pools_10_15_12();
        let (pool, out) = route_best_price(&pools, &quote, &base, 10, Slippage::ZERO).unwrap();
        assert!(out.id().is_native());
        // a 10-token deposit buys the most ERG from the shallowest token side
        assert_eq!(pool.id, token_id(1));
    }

    #[test]
    fn first_seen_wins_ties() {
        let (base, quote) = erg_to_token();
        let pools = vec![
            n2t_pool(1, 997_000, token_id(0xaa), 30),
            n2t_pool(2, 997_000, token_id(0xaa), 30),
        ];
        let (pool, _) = route_best_price(&pools, &base, &quote, 1_000_000, Slippage::ZERO).unwrap();
        assert_eq!(pool.id, token_id(1));
    }

    #[test]
    fn dry_pools_are_skipped() {
        let (base, quote) = erg_to_token();
        let pools = vec![
            n2t_pool(1, 1_000_000_000_000, token_id(0xaa), 1),
            n2t_pool(2, 997_000, token_id(0xaa), 24),
        ];
        let (pool, out) = route_best_price(&pools, &base, &quote, 1_000_000, Slippage::ZERO).unwrap();
        assert_eq!(pool.id, token_id(2));
        assert_eq!(out.amount, 12);
    }

    #[test]
    fn no_pool_for_pair() {
        let base = AssetId::Native;
        let quote = AssetId::Token(token_id(0xbb));
        let err = route_best_price(&pools_10_15_12(), &base, &quote, 1_000, Slippage::ZERO).unwrap_err();
        assert!(matches!(err, Error::NoViableRoute { .. }));
        let err = route_best_price(&[], &base, &quote, 1_000, Slippage::ZERO).unwrap_err();
        assert!(matches!(err, Error::NoViableRoute { .. }));
    }

    #[test]
    fn best_order_prefers_greatest_min_output() {
        let (base, quote) = erg_to_token();
        let pools = vec![
            n2t_pool(1, 50_000_000_000, token_id(0xaa), 1_000_000),
            n2t_pool(2, 50_000_000_000, token_id(0xaa), 3_000_000),
            n2t_pool(3, 50_000_000_000, token_id(0xaa), 2_000_000),
        ];
        let (pool, order) = route_best_order(
            &pools,
            &base,
            &quote,
            1_000_000_000,
            Slippage::from_percent(1).unwrap(),
            &FeePolicy {
                miner_fee: 2_000_000,
                fee_budget_multiplier: 3,
                min_nitro: Nitro::default(),
            },
        )
        .unwrap();
        assert_eq!(pool.id, token_id(2));
        assert_eq!(order.pool_id, token_id(2));
    }
}
