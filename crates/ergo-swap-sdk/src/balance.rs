use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::asset::{Amount, AssetId, ErgoBox, TokenId};
use crate::error::{Error, Result};

/// Native and per-token totals of a set of boxes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub native: Amount,
    pub tokens: BTreeMap<TokenId, Amount>,
}

impl Balance {
    /// Total held of `asset`; zero when absent.
    pub fn amount_of(&self, asset: &AssetId) -> Amount {
        match asset {
            AssetId::Native => self.native,
            AssetId::Token(id) => self.tokens.get(id).copied().unwrap_or(0),
        }
    }

    /// Add one box's value and tokens to the running totals.
    pub fn add_box(&mut self, ergo_box: &ErgoBox) -> Result<()> {
        self.native = self
            .native
            .checked_add(ergo_box.value)
            .ok_or(Error::Overflow("native balance"))?;
        for entry in &ergo_box.assets {
            let AssetId::Token(id) = entry.asset.id else {
                continue;
            };
            let total = self.tokens.entry(id).or_insert(0);
            *total = total
                .checked_add(entry.amount)
                .ok_or(Error::Overflow("token balance"))?;
        }
        Ok(())
    }

    /// Remove one box's value and tokens; entries that reach zero are dropped.
    pub(crate) fn remove_box(&mut self, ergo_box: &ErgoBox) -> Result<()> {
        self.native = self
            .native
            .checked_sub(ergo_box.value)
            .ok_or(Error::Overflow("native balance"))?;
        for entry in &ergo_box.assets {
            let AssetId::Token(id) = entry.asset.id else {
                continue;
            };
            let total = self
                .tokens
                .get_mut(&id)
                .ok_or(Error::Overflow("token balance"))?;
            *total = total
                .checked_sub(entry.amount)
                .ok_or(Error::Overflow("token balance"))?;
            if *total == 0 {
                self.tokens.remove(&id);
            }
        }
        Ok(())
    }
}

/// Fold a box set into its native total and per-token totals.
///
/// Addition is commutative, so any ordering of the same boxes yields the
/// same balance.
pub fn aggregate(boxes: &[ErgoBox]) -> Result<Balance> {
    let mut balance = Balance::default();
    for b in boxes {
        balance.add_box(b)?;
    }
    Ok(balance)
}
