//! Swap orders and their exchange-fee economics.
//!
//! A swap order box pays an off-chain executor out of an exchange-fee budget
//! proportional to the output it delivers: `ex_fee = output * num / denom`.
//! The executor may deliver more than the minimum output (up to
//! `max_output`) and is then paid up to `max_ex_fee`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::amm_pool::math::{BPS_DENOM, Slippage, output_amount};
use crate::amm_pool::pool::{Pool, PoolId};
use crate::asset::{Amount, AssetAmount, AssetId, ErgoBox, MAX_LONG};
use crate::error::{Error, Result};
use crate::selection::{Selection, select_boxes};
use crate::units;

/// Default ratio between the exchange-fee budget and the miner fee.
pub const DEFAULT_FEE_BUDGET_MULTIPLIER: u32 = 3;

/// Ratio of the maximum to the minimum exchange fee, in basis points
/// (10000 = 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Nitro(u32);

impl Nitro {
    pub const ONE: Nitro = Nitro(BPS_DENOM);

    pub fn from_bps(bps: u32) -> Result<Self> {
        if bps < BPS_DENOM {
            return Err(Error::UnsatisfiableOrder(format!(
                "nitro {bps} bps is below 1.0"
            )));
        }
        Ok(Self(bps))
    }

    pub fn bps(self) -> u32 {
        self.0
    }
}

impl Default for Nitro {
    /// 1.2
    fn default() -> Self {
        Nitro(12_000)
    }
}

impl TryFrom<u32> for Nitro {
    type Error = Error;

    fn try_from(bps: u32) -> Result<Self> {
        Self::from_bps(bps)
    }
}

impl From<Nitro> for u32 {
    fn from(n: Nitro) -> u32 {
        n.0
    }
}

/// Parses a decimal multiplier with up to four decimals, e.g. `"1.2"`.
impl FromStr for Nitro {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bps = units::parse_units(s, 4)?;
        let bps = u32::try_from(bps)
            .map_err(|_| Error::InvalidAmount(format!("nitro {s:?} out of range")))?;
        Self::from_bps(bps)
    }
}

impl fmt::Display for Nitro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = units::format_units(Amount::from(self.0), 4).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

/// Exchange fee paid per unit of output, as a reduced fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExFeePerToken {
    pub num: Amount,
    pub denom: Amount,
}

/// Bounds of one order's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapExtremes {
    pub min_output: AssetAmount,
    pub max_output: AssetAmount,
    pub min_ex_fee: Amount,
    pub max_ex_fee: Amount,
    pub ex_fee_per_token: ExFeePerToken,
}

fn gcd(mut a: Amount, mut b: Amount) -> Amount {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Derive the fee fraction and output bounds from an exchange-fee budget.
///
/// Fails with [`Error::UnsatisfiableOrder`] when the budget or minimum output
/// is zero, `nitro` is below 1.0, or a value that goes into a register does
/// not fit a ledger `Long`.
pub fn swap_extremes(
    fee_budget: Amount,
    nitro: Nitro,
    min_output: &AssetAmount,
) -> Result<SwapExtremes> {
    if fee_budget == 0 {
        return Err(Error::UnsatisfiableOrder("exchange fee budget is zero".into()));
    }
    if min_output.amount == 0 {
        return Err(Error::UnsatisfiableOrder("minimum output is zero".into()));
    }
    if nitro.bps() < BPS_DENOM {
        return Err(Error::UnsatisfiableOrder(format!(
            "nitro {nitro} is below 1.0"
        )));
    }

    let g = gcd(fee_budget, min_output.amount);
    let per_token = ExFeePerToken {
        num: fee_budget / g,
        denom: min_output.amount / g,
    };
    if per_token.num > MAX_LONG || per_token.denom > MAX_LONG {
        return Err(Error::UnsatisfiableOrder(format!(
            "exchange fee per token {}/{} does not fit a Long",
            per_token.num, per_token.denom
        )));
    }

    let min_ex_fee = per_token
        .num
        .checked_mul(min_output.amount)
        .ok_or(Error::Overflow("minimum exchange fee"))?
        / per_token.denom;
    let max_ex_fee = min_ex_fee
        .checked_mul(Amount::from(nitro.bps()))
        .ok_or(Error::Overflow("maximum exchange fee"))?
        / Amount::from(BPS_DENOM);
    if max_ex_fee > MAX_LONG {
        return Err(Error::UnsatisfiableOrder(format!(
            "maximum exchange fee {max_ex_fee} does not fit a Long"
        )));
    }
    let max_output = max_ex_fee
        .checked_mul(per_token.denom)
        .ok_or(Error::Overflow("maximum output"))?
        / per_token.num;

    Ok(SwapExtremes {
        min_output: *min_output,
        max_output: min_output.with_amount(max_output),
        min_ex_fee,
        max_ex_fee,
        ex_fee_per_token: per_token,
    })
}

/// Fee settings every order is priced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    pub miner_fee: Amount,
    pub fee_budget_multiplier: u32,
    pub min_nitro: Nitro,
}

/// A priced swap against one pool, not yet funded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOrder {
    pub pool_id: PoolId,
    pub input: AssetAmount,
    /// Output at zero slippage, for display.
    pub expected_output: AssetAmount,
    pub slippage: Slippage,
    pub extremes: SwapExtremes,
    pub fee_budget: Amount,
    pub miner_fee: Amount,
}

/// Price a swap of `input` through `pool`.
///
/// The exchange-fee budget is `miner_fee * fee_budget_multiplier`. Pool
/// liquidity is checked before anything else.
pub fn build_order(
    pool: &Pool,
    input: &AssetAmount,
    slippage: Slippage,
    miner_fee: Amount,
    fee_budget_multiplier: u32,
    min_nitro: Nitro,
) -> Result<SwapOrder> {
    let min_output = output_amount(pool, input, slippage)?;
    let expected_output = output_amount(pool, input, Slippage::ZERO)?;
    let fee_budget = miner_fee
        .checked_mul(Amount::from(fee_budget_multiplier))
        .ok_or(Error::Overflow("exchange fee budget"))?;
    let extremes = swap_extremes(fee_budget, min_nitro, &min_output)?;
    Ok(SwapOrder {
        pool_id: pool.id,
        input: *input,
        expected_output,
        slippage,
        extremes,
        fee_budget,
        miner_fee,
    })
}

impl SwapOrder {
    /// Native value locked in the order box: the ERG input (or the box
    /// minimum when the input is a token), the maximum exchange fee, and the
    /// executor's miner fee.
    pub fn order_box_value(&self, min_box_value: Amount) -> Result<Amount> {
        let base = if self.input.id().is_native() {
            self.input.amount
        } else {
            min_box_value
        };
        let value = base
            .checked_add(self.extremes.max_ex_fee)
            .and_then(|v| v.checked_add(self.miner_fee))
            .ok_or(Error::Overflow("order box value"))?;
        if value < min_box_value {
            return Err(Error::InvalidAmount(format!(
                "order box value {value} is below the minimum box value {min_box_value}"
            )));
        }
        if value > MAX_LONG {
            return Err(Error::Overflow("order box value"));
        }
        Ok(value)
    }

    /// Amounts the wallet must cover: the order box value plus the
    /// transaction's miner fee, and the input token if any.
    pub fn funding_targets(&self, min_box_value: Amount) -> Result<Vec<AssetAmount>> {
        let native = self
            .order_box_value(min_box_value)?
            .checked_add(self.miner_fee)
            .ok_or(Error::Overflow("funding target"))?;
        let mut targets = vec![AssetAmount::native(native)];
        if let AssetId::Token(_) = self.input.id() {
            targets.push(self.input);
        }
        Ok(targets)
    }
}

/// An order together with the wallet boxes that pay for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundedOrder {
    pub order: SwapOrder,
    pub selection: Selection,
    pub order_box_value: Amount,
    pub min_box_value: Amount,
}

impl FundedOrder {
    /// Miner fee of the transaction that places the order.
    pub fn tx_fee(&self) -> Amount {
        self.order.miner_fee
    }
}

/// Select boxes from `boxes` to fund `order`, reserving `min_box_value` for
/// the change box.
pub fn fund_order(order: SwapOrder, boxes: &[ErgoBox], min_box_value: Amount) -> Result<FundedOrder> {
    let order_box_value = order.order_box_value(min_box_value)?;
    let targets = order.funding_targets(min_box_value)?;
    let selection = select_boxes(boxes, &targets, min_box_value)?;
    Ok(FundedOrder {
        order,
        selection,
        order_box_value,
        min_box_value,
    })
}
