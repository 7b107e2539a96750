//! Pool box layouts.
//!
//! N2T pool: tokens `[NFT, LP, Y]`, ERG reserve is the box value.
//! T2T pool: tokens `[NFT, LP, X, Y]`.
//! Both carry the fee numerator in R4 as an `Int`; the denominator is fixed.

use super::pool::{Pool, PoolKind};
use crate::asset::{Amount, AssetAmount, AssetId, ErgoBox};
use crate::error::{Error, Result};
use crate::sigma;

/// ErgoTree of native-to-token pool boxes.
pub const N2T_POOL_TREE: &str = "1999030f0400040204020404040405feffffffffffffffff0105feffffffffffffffff01050004d00f040004000406050005000580dac409d819d601b2a5730000d602e4c6a70404d603db63087201d604db6308a7d605b27203730100d606b27204730200d607b27203730300d608b27204730400d6099973058c720602d60a999973068c7205027209d60bc17201d60cc1a7d60d99720b720cd60e91720d7307d60f8c720802d6107e720f06d6117e720d06d612998c720702720fd6137e720c06d6147308d6157e721206d6167e720a06d6177e720906d6189c72117217d6199c72157217d1ededededededed93c27201c2a793e4c672010404720293b27203730900b27204730a00938c7205018c720601938c7207018c72080193b17203730b9593720a730c95720e929c9c721072117e7202069c7ef07212069a9c72137e7214067e9c720d7e72020506929c9c721372157e7202069c7ef0720d069a9c72107e7214067e9c72127e7202050695ed720e917212730d907216a19d721872139d72197210ed9272189c721672139272199c7216721091720b730e";

/// ErgoTree of token-to-token pool boxes.
pub const T2T_POOL_TREE: &str = "19a9030f040004020402040404040406040605feffffffffffffffff0105feffffffffffffffff01050004d00f0400040005000500d81ad601b2a5730000d602e4c6a70404d603db63087201d604db6308a7d605b27203730100d606b27204730200d607b27203730300d608b27204730400d609b27203730500d60ab27204730600d60b9973078c720602d60c999973088c720502720bd60d8c720802d60e998c720702720dd60f91720e7309d6108c720a02d6117e721006d6127e720e06d613998c7209027210d6147e720d06d615730ad6167e721306d6177e720c06d6187e720b06d6199c72127218d61a9c72167218d1edededededed93c27201c2a793e4c672010404720292c17201c1a793b27203730b00b27204730c00938c7205018c720601ed938c7207018c720801938c7209018c720a019593720c730d95720f929c9c721172127e7202069c7ef07213069a9c72147e7215067e9c720e7e72020506929c9c721472167e7202069c7ef0720e069a9c72117e7215067e9c72137e7202050695ed720f917213730e907217a19d721972149d721a7211ed9272199c7217721492721a9c72177211";

/// LP tokens minted at pool creation; circulating supply is this minus the
/// amount still locked in the pool box.
pub const LP_TOTAL_EMISSION: Amount = i64::MAX as Amount;

/// Fee denominator shared by every pool contract.
pub const POOL_FEE_DENOM: u32 = 1000;

impl PoolKind {
    /// ErgoTree every pool box of this kind is locked by.
    pub fn ergo_tree(self) -> &'static str {
        match self {
            PoolKind::N2T => N2T_POOL_TREE,
            PoolKind::T2T => T2T_POOL_TREE,
        }
    }

    /// Kind whose contract is `ergo_tree`, if any.
    pub fn from_ergo_tree(ergo_tree: &str) -> Option<Self> {
        PoolKind::ALL
            .into_iter()
            .find(|kind| kind.ergo_tree().eq_ignore_ascii_case(ergo_tree))
    }
}

fn token_at(ergo_box: &ErgoBox, index: usize, role: &str) -> Result<AssetAmount> {
    let entry = ergo_box.assets.get(index).ok_or_else(|| {
        Error::InvalidPool(format!(
            "pool box {} has no {role} token at index {index}",
            ergo_box.box_id
        ))
    })?;
    if entry.id().is_native() {
        return Err(Error::InvalidPool(format!(
            "pool box {} has a native entry in its token list",
            ergo_box.box_id
        )));
    }
    Ok(*entry)
}

fn fee_num(ergo_box: &ErgoBox) -> Result<u32> {
    let raw = ergo_box.register("R4").ok_or_else(|| {
        Error::InvalidPool(format!("pool box {} has no fee register", ergo_box.box_id))
    })?;
    let fee = sigma::decode_int(raw)?;
    u32::try_from(fee).map_err(|_| {
        Error::InvalidPool(format!(
            "pool box {} has negative fee numerator {fee}",
            ergo_box.box_id
        ))
    })
}

/// Read a pool snapshot out of a pool box of the given layout.
pub fn parse_pool(kind: PoolKind, ergo_box: &ErgoBox) -> Result<Pool> {
    let nft = token_at(ergo_box, 0, "NFT")?;
    let lp_locked = token_at(ergo_box, 1, "LP")?;
    let (x, y) = match kind {
        PoolKind::N2T => (AssetAmount::native(ergo_box.value), token_at(ergo_box, 2, "Y")?),
        PoolKind::T2T => (token_at(ergo_box, 2, "X")?, token_at(ergo_box, 3, "Y")?),
    };
    let lp_supply = LP_TOTAL_EMISSION.checked_sub(lp_locked.amount).ok_or_else(|| {
        Error::InvalidPool(format!(
            "pool box {} locks more LP than was emitted",
            ergo_box.box_id
        ))
    })?;

    let AssetId::Token(id) = nft.id() else {
        return Err(Error::InvalidPool(format!(
            "pool box {} has a native NFT",
            ergo_box.box_id
        )));
    };

    let pool = Pool {
        id,
        box_id: ergo_box.box_id,
        kind,
        lp: lp_locked.with_amount(lp_supply),
        x,
        y,
        fee_num: fee_num(ergo_box)?,
        fee_denom: POOL_FEE_DENOM,
    };
    pool.validate()?;
    Ok(pool)
}

/// Parse a box of unknown layout by matching its ErgoTree against the pool
/// contracts.
pub fn parse_pool_box(ergo_box: &ErgoBox) -> Result<Pool> {
    let kind = PoolKind::from_ergo_tree(&ergo_box.ergo_tree).ok_or_else(|| {
        Error::InvalidPool(format!(
            "box {} is not locked by a pool contract",
            ergo_box.box_id
        ))
    })?;
    parse_pool(kind, ergo_box)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Asset, BoxId};
    use crate::testing::{erg_box, token_id};

    fn pool_box(kind: PoolKind, value: Amount, tokens: &[(u8, Amount)], fee: Option<i32>) -> ErgoBox {
        let mut b = erg_box(9, value);
        b.ergo_tree = kind.ergo_tree().to_string();
        b.assets = tokens
            .iter()
            .map(|&(seed, amount)| AssetAmount::new(Asset::token(token_id(seed), 0), amount))
            .collect();
        if let Some(fee) = fee {
            b.additional_registers
                .insert("R4".to_string(), sigma::encode_int(fee));
        }
        b
    }

    #[test]
    fn parses_n2t_layout() {
        let b = pool_box(
            PoolKind::N2T,
            5_000_000_000,
            &[(0x01, 1), (0x02, LP_TOTAL_EMISSION - 1_000), (0x03, 42_000)],
            Some(997),
        );
        let pool = parse_pool_box(&b).unwrap();
        assert_eq!(pool.kind, PoolKind::N2T);
        assert_eq!(pool.id, token_id(0x01));
        assert_eq!(pool.box_id, BoxId::from_bytes([9; 32]));
        assert_eq!(pool.lp.amount, 1_000);
        assert!(pool.x.id().is_native());
        assert_eq!(pool.x.amount, 5_000_000_000);
        assert_eq!(pool.y.id(), AssetId::Token(token_id(0x03)));
        assert_eq!(pool.y.amount, 42_000);
        assert_eq!((pool.fee_num, pool.fee_denom), (997, 1000));
    }

    #[test]
    fn parses_t2t_layout() {
        let b = pool_box(
            PoolKind::T2T,
            1_000_000,
            &[(0x01, 1), (0x02, LP_TOTAL_EMISSION), (0x03, 10), (0x04, 20)],
            Some(995),
        );
        let pool = parse_pool_box(&b).unwrap();
        assert_eq!(pool.kind, PoolKind::T2T);
        assert_eq!(pool.lp.amount, 0);
        assert_eq!(pool.x.id(), AssetId::Token(token_id(0x03)));
        assert_eq!(pool.y.amount, 20);
        assert_eq!(pool.fee_num, 995);
    }

    #[test]
    fn missing_fee_register_is_an_error() {
        let b = pool_box(PoolKind::N2T, 1, &[(0x01, 1), (0x02, 5), (0x03, 5)], None);
        assert!(matches!(parse_pool_box(&b), Err(Error::InvalidPool(_))));
    }

    #[test]
    fn short_token_list_is_an_error() {
        let b = pool_box(PoolKind::T2T, 1, &[(0x01, 1), (0x02, 5), (0x03, 5)], Some(997));
        assert!(parse_pool_box(&b).is_err());
    }

    #[test]
    fn foreign_tree_is_rejected() {
        let b = erg_box(1, 1_000);
        assert!(parse_pool_box(&b).is_err());
        assert_eq!(PoolKind::from_ergo_tree(N2T_POOL_TREE), Some(PoolKind::N2T));
    }
}
