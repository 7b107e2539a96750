use std::fmt;

use serde::{Deserialize, Serialize};

use crate::asset::{Amount, Asset, AssetAmount, AssetId, BoxId, TokenId};
use crate::error::{Error, Result};

/// A pool is identified by the id of its NFT.
pub type PoolId = TokenId;

/// Pool box layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    /// Native ERG (box value) against a token.
    N2T,
    /// Token against token.
    T2T,
}

impl PoolKind {
    pub const ALL: [PoolKind; 2] = [PoolKind::N2T, PoolKind::T2T];

    pub fn as_str(self) -> &'static str {
        match self {
            PoolKind::N2T => "n2t",
            PoolKind::T2T => "t2t",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time snapshot of one constant-product pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    /// Box currently holding the pool state.
    pub box_id: BoxId,
    pub kind: PoolKind,
    /// Outstanding LP token supply.
    pub lp: AssetAmount,
    pub x: AssetAmount,
    pub y: AssetAmount,
    pub fee_num: u32,
    pub fee_denom: u32,
}

impl Pool {
    /// Check the fee fraction and that both sides are distinct assets.
    pub fn validate(&self) -> Result<()> {
        if self.fee_denom == 0 {
            return Err(Error::InvalidPool(format!(
                "pool {} has zero fee denominator",
                self.id
            )));
        }
        if self.fee_num >= self.fee_denom {
            return Err(Error::InvalidPool(format!(
                "pool {} fee {}/{} must be below one",
                self.id, self.fee_num, self.fee_denom
            )));
        }
        if self.x.id() == self.y.id() {
            return Err(Error::InvalidPool(format!(
                "pool {} trades {} against itself",
                self.id,
                self.x.id()
            )));
        }
        Ok(())
    }

    /// Whether the pool trades the unordered pair `(a, b)`.
    pub fn trades(&self, a: &AssetId, b: &AssetId) -> bool {
        let (x, y) = (self.x.id(), self.y.id());
        (x == *a && y == *b) || (x == *b && y == *a)
    }

    /// The pool-side description of `asset` (carries the decimals).
    pub fn asset(&self, asset: &AssetId) -> Option<Asset> {
        if self.x.id() == *asset {
            Some(self.x.asset)
        } else if self.y.id() == *asset {
            Some(self.y.asset)
        } else {
            None
        }
    }

    /// `(reserve_in, reserve_out)` for a swap that deposits `input`.
    pub fn reserves_for(&self, input: &AssetId) -> Result<(Amount, &AssetAmount)> {
        if self.x.id() == *input {
            Ok((self.x.amount, &self.y))
        } else if self.y.id() == *input {
            Ok((self.y.amount, &self.x))
        } else {
            Err(Error::InvalidAssetForPool {
                asset: *input,
                pool_id: self.id.to_hex(),
            })
        }
    }
}

/// Human-facing pool name such as `ERG/SigUSD`.
///
/// `resolve` maps an asset to its symbol; unresolved tokens fall back to the
/// first 8 hex characters of their id.
pub fn pool_display_name(pool: &Pool, resolve: impl Fn(&AssetId) -> Option<String>) -> String {
    let name = |id: &AssetId| {
        resolve(id).unwrap_or_else(|| match id {
            AssetId::Native => crate::asset::ERG_SYMBOL.to_string(),
            AssetId::Token(t) => t.to_hex()[..8].to_string(),
        })
    };
    format!("{}/{}", name(&pool.x.id()), name(&pool.y.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{n2t_pool, t2t_pool, token_id};

    #[test]
    fn validate_rejects_bad_fees() {
        let mut pool = n2t_pool(1, 1_000, token_id(0xaa), 2_000);
        assert!(pool.validate().is_ok());
        pool.fee_num = 1000;
        assert!(matches!(pool.validate(), Err(Error::InvalidPool(_))));
        pool.fee_denom = 0;
        assert!(matches!(pool.validate(), Err(Error::InvalidPool(_))));
    }

    #[test]
    fn validate_rejects_same_asset_on_both_sides() {
        let pool = t2t_pool(1, token_id(0xaa), 10, token_id(0xaa), 10);
        assert!(pool.validate().is_err());
    }

    #[test]
    fn trades_is_unordered() {
        let pool = n2t_pool(1, 1_000, token_id(0xaa), 2_000);
        let t = AssetId::Token(token_id(0xaa));
        assert!(pool.trades(&AssetId::Native, &t));
        assert!(pool.trades(&t, &AssetId::Native));
        assert!(!pool.trades(&t, &AssetId::Token(token_id(0xbb))));
    }

    #[test]
    fn reserves_for_picks_the_deposit_side() {
        let pool = n2t_pool(1, 1_000, token_id(0xaa), 2_000);
        let (r_in, out) = pool.reserves_for(&AssetId::Native).unwrap();
        assert_eq!(r_in, 1_000);
        assert_eq!(out.amount, 2_000);
        let (r_in, out) = pool.reserves_for(&AssetId::Token(token_id(0xaa))).unwrap();
        assert_eq!(r_in, 2_000);
        assert!(out.id().is_native());
        assert!(matches!(
            pool.reserves_for(&AssetId::Token(token_id(0xcc))),
            Err(Error::InvalidAssetForPool { .. })
        ));
    }

    #[test]
    fn display_name_uses_resolver_then_hex_prefix() {
        let pool = n2t_pool(1, 1_000, token_id(0xab), 2_000);
        assert_eq!(pool_display_name(&pool, |_| None), "ERG/abababab");
        let named = pool_display_name(&pool, |id| match id {
            AssetId::Token(_) => Some("SigUSD".to_string()),
            AssetId::Native => None,
        });
        assert_eq!(named, "ERG/SigUSD");
    }
}
