use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pool::Pool;
use crate::asset::{Amount, AssetAmount};
use crate::error::{Error, Result};
use crate::units;

/// Basis point denominator (100% = 10000).
pub const BPS_DENOM: u32 = 10_000;

/// Tolerated price movement, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Slippage(u32);

impl Slippage {
    pub const ZERO: Slippage = Slippage(0);

    pub fn from_bps(bps: u32) -> Result<Self> {
        if bps > BPS_DENOM {
            return Err(Error::InvalidSlippage(bps));
        }
        Ok(Self(bps))
    }

    /// Whole percent, e.g. `1` for 1%.
    pub fn from_percent(percent: u32) -> Result<Self> {
        let bps = percent
            .checked_mul(100)
            .ok_or(Error::InvalidSlippage(u32::MAX))?;
        Self::from_bps(bps)
    }

    pub fn bps(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Slippage {
    type Error = Error;

    fn try_from(bps: u32) -> Result<Self> {
        Self::from_bps(bps)
    }
}

impl From<Slippage> for u32 {
    fn from(s: Slippage) -> u32 {
        s.0
    }
}

/// Parses a percentage with up to two decimals: `"0.5"` is 50 bps.
impl FromStr for Slippage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().trim_end_matches('%');
        let bps = units::parse_units(s, 2)?;
        let bps = u32::try_from(bps).map_err(|_| Error::InvalidSlippage(u32::MAX))?;
        Self::from_bps(bps)
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = units::format_units(Amount::from(self.0), 2).map_err(|_| fmt::Error)?;
        write!(f, "{pct}%")
    }
}

/// Constant-product output for depositing `input` into `pool`, reduced by
/// `slippage`.
///
/// All steps floor. Fails with `InvalidAssetForPool` when `input` is neither
/// side of the pool and with `InsufficientLiquidity` when the input, either
/// reserve, or the final output is zero.
pub fn output_amount(pool: &Pool, input: &AssetAmount, slippage: Slippage) -> Result<AssetAmount> {
    let (reserve_in, reserve_out) = pool.reserves_for(&input.id())?;
    let insufficient = || Error::InsufficientLiquidity {
        pool_id: pool.id.to_hex(),
        input: input.amount,
    };
    if input.amount == 0 || reserve_in == 0 || reserve_out.amount == 0 {
        return Err(insufficient());
    }
    if pool.fee_denom == 0 {
        return Err(Error::InvalidPool(format!(
            "pool {} has zero fee denominator",
            pool.id
        )));
    }

    let effective = input
        .amount
        .checked_mul(Amount::from(pool.fee_num))
        .ok_or(Error::Overflow("fee-adjusted input"))?
        / Amount::from(pool.fee_denom);

    let numerator = reserve_out
        .amount
        .checked_mul(effective)
        .ok_or(Error::Overflow("swap output numerator"))?;
    let denominator = reserve_in
        .checked_add(effective)
        .ok_or(Error::Overflow("swap output denominator"))?;
    let raw = numerator / denominator;

    let output = raw
        .checked_mul(Amount::from(BPS_DENOM - slippage.bps()))
        .ok_or(Error::Overflow("slippage-adjusted output"))?
        / Amount::from(BPS_DENOM);

    if output == 0 {
        return Err(insufficient());
    }
    Ok(reserve_out.with_amount(output))
}
