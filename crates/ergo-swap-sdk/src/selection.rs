//! Deterministic box selection.
//!
//! Boxes are accumulated greedily in the order given (the caller's order
//! decides which boxes are preferred) until every requirement is met, then a
//! pruning pass drops each box whose removal still leaves every requirement
//! met. Coverage is monotone in the selected set, so after pruning no single
//! selected box can be removed.

use std::collections::BTreeMap;

use crate::asset::{Amount, AssetAmount, AssetId, ErgoBox, TokenId};
use crate::balance::Balance;
use crate::error::{Error, Result, Shortfall};

/// Boxes chosen to fund a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Selected boxes, in input order.
    pub boxes: Vec<ErgoBox>,
    /// Totals of the selected boxes.
    pub totals: Balance,
    /// `totals` minus the summed targets (not the reserve).
    pub change: Balance,
}

#[derive(Debug, Default)]
struct Requirements {
    /// Native targets only.
    native_targets: Amount,
    /// Native targets plus the reserve.
    native: Amount,
    tokens: BTreeMap<TokenId, Amount>,
}

impl Requirements {
    fn new(targets: &[AssetAmount], min_erg_reserve: Amount) -> Result<Self> {
        let mut req = Requirements::default();
        for target in targets {
            match target.id() {
                AssetId::Native => {
                    req.native_targets = req
                        .native_targets
                        .checked_add(target.amount)
                        .ok_or(Error::Overflow("native target"))?;
                }
                AssetId::Token(id) => {
                    let total = req.tokens.entry(id).or_insert(0);
                    *total = total
                        .checked_add(target.amount)
                        .ok_or(Error::Overflow("token target"))?;
                }
            }
        }
        req.tokens.retain(|_, amount| *amount > 0);
        req.native = req
            .native_targets
            .checked_add(min_erg_reserve)
            .ok_or(Error::Overflow("native requirement"))?;
        Ok(req)
    }

    fn covered_by(&self, totals: &Balance) -> bool {
        totals.native >= self.native
            && self
                .tokens
                .iter()
                .all(|(id, need)| totals.tokens.get(id).copied().unwrap_or(0) >= *need)
    }

    /// Whether `b` adds anything still missing from `totals`.
    fn wants(&self, totals: &Balance, b: &ErgoBox) -> bool {
        if totals.native < self.native && b.value > 0 {
            return true;
        }
        b.assets.iter().any(|a| match a.id() {
            AssetId::Token(id) => self
                .tokens
                .get(&id)
                .is_some_and(|need| totals.tokens.get(&id).copied().unwrap_or(0) < *need),
            AssetId::Native => false,
        })
    }

    fn shortfalls(&self, totals: &Balance) -> Vec<Shortfall> {
        let mut out = Vec::new();
        if totals.native < self.native {
            out.push(Shortfall {
                asset: AssetId::Native,
                required: self.native,
                available: totals.native,
            });
        }
        for (id, need) in &self.tokens {
            let have = totals.tokens.get(id).copied().unwrap_or(0);
            if have < *need {
                out.push(Shortfall {
                    asset: AssetId::Token(*id),
                    required: *need,
                    available: have,
                });
            }
        }
        out
    }

    fn change(&self, totals: &Balance) -> Result<Balance> {
        let mut change = totals.clone();
        change.native = change
            .native
            .checked_sub(self.native_targets)
            .ok_or(Error::Overflow("native change"))?;
        for (id, need) in &self.tokens {
            let left = change
                .tokens
                .get(id)
                .copied()
                .unwrap_or(0)
                .checked_sub(*need)
                .ok_or(Error::Overflow("token change"))?;
            if left == 0 {
                change.tokens.remove(id);
            } else {
                change.tokens.insert(*id, left);
            }
        }
        Ok(change)
    }
}

/// Select a subset of `boxes` covering `targets` plus `min_erg_reserve`
/// nanoERG (the floor a change box needs).
///
/// Duplicate targets for one asset are summed. Tokens not named by any
/// target end up in [`Selection::change`]. When even all boxes together fall
/// short, fails with [`Error::InsufficientInputs`] listing every unmet asset.
pub fn select_boxes(
    boxes: &[ErgoBox],
    targets: &[AssetAmount],
    min_erg_reserve: Amount,
) -> Result<Selection> {
    let req = Requirements::new(targets, min_erg_reserve)?;

    let mut totals = Balance::default();
    let mut picked: Vec<usize> = Vec::new();
    for (i, b) in boxes.iter().enumerate() {
        if req.covered_by(&totals) {
            break;
        }
        if !req.wants(&totals, b) {
            continue;
        }
        totals.add_box(b)?;
        picked.push(i);
    }

    if !req.covered_by(&totals) {
        // Skipped boxes cannot help, so this is also the shortfall of the
        // whole list.
        let shortfalls = req.shortfalls(&totals);
        log::debug!(
            "selection failed over {} boxes: {} unmet targets",
            boxes.len(),
            shortfalls.len()
        );
        return Err(Error::InsufficientInputs(shortfalls));
    }

    // Prune from the most recently added box back to the first.
    let mut k = picked.len();
    while k > 0 {
        k -= 1;
        let b = &boxes[picked[k]];
        let mut without = totals.clone();
        without.remove_box(b)?;
        if req.covered_by(&without) {
            totals = without;
            picked.remove(k);
        }
    }

    let change = req.change(&totals)?;
    log::debug!(
        "selected {} of {} boxes, native total {}",
        picked.len(),
        boxes.len(),
        totals.native
    );
    Ok(Selection {
        boxes: picked.into_iter().map(|i| boxes[i].clone()).collect(),
        totals,
        change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::balance::aggregate;
    use crate::testing::{erg_box, token_box, token_id};

    fn tok(seed: u8, amount: Amount) -> AssetAmount {
        AssetAmount::new(Asset::token(token_id(seed), 0), amount)
    }

    fn assert_minimal(sel: &Selection, targets: &[AssetAmount], reserve: Amount) {
        let req = Requirements::new(targets, reserve).unwrap();
        assert!(req.covered_by(&sel.totals));
        for skip in 0..sel.boxes.len() {
            let rest: Vec<ErgoBox> = sel
                .boxes
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, b)| b.clone())
                .collect();
            assert!(
                !req.covered_by(&aggregate(&rest).unwrap()),
                "box {skip} is removable"
            );
        }
    }

    #[test]
    fn token_shortfall_is_reported() {
        let boxes = vec![token_box(1, 1_000_000, &[(token_id(0xaa), 50)])];
        let err = select_boxes(&boxes, &[tok(0xaa, 120)], 0).unwrap_err();
        let Error::InsufficientInputs(shortfalls) = err else {
            panic!("expected InsufficientInputs, got {err}");
        };
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].asset, AssetId::Token(token_id(0xaa)));
        assert_eq!(shortfalls[0].required, 120);
        assert_eq!(shortfalls[0].available, 50);
        assert_eq!(shortfalls[0].missing(), 70);
    }

    #[test]
    fn every_unmet_target_is_listed() {
        let boxes = vec![erg_box(1, 10), token_box(2, 5, &[(token_id(0xaa), 1)])];
        let err = select_boxes(
            &boxes,
            &[AssetAmount::native(100), tok(0xaa, 2), tok(0xbb, 1)],
            0,
        )
        .unwrap_err();
        let Error::InsufficientInputs(shortfalls) = err else {
            panic!("expected InsufficientInputs");
        };
        let assets: Vec<AssetId> = shortfalls.iter().map(|s| s.asset).collect();
        assert_eq!(
            assets,
            vec![
                AssetId::Native,
                AssetId::Token(token_id(0xaa)),
                AssetId::Token(token_id(0xbb))
            ]
        );
        assert_eq!(shortfalls[0].available, 15);
    }

    #[test]
    fn pruning_drops_boxes_made_redundant() {
        // Greedy takes 1 and 2 for native, then 3 for the token; 3 alone
        // covers native as well, so 1 and 2 are pruned.
        let boxes = vec![
            erg_box(1, 400),
            erg_box(2, 400),
            token_box(3, 5_000, &[(token_id(0xaa), 10)]),
        ];
        let targets = [AssetAmount::native(700), tok(0xaa, 10)];
        let sel = select_boxes(&boxes, &targets, 0).unwrap();
        assert_eq!(sel.boxes.len(), 1);
        assert_eq!(sel.boxes[0].box_id, boxes[2].box_id);
        assert_minimal(&sel, &targets, 0);
    }

    #[test]
    fn reserve_is_always_required() {
        let boxes = vec![erg_box(1, 1_000), erg_box(2, 1_000)];
        let sel = select_boxes(&boxes, &[AssetAmount::native(1_000)], 500).unwrap();
        assert_eq!(sel.boxes.len(), 2);
        assert_eq!(sel.change.native, 1_000);

        let err = select_boxes(&boxes, &[AssetAmount::native(1_800)], 500).unwrap_err();
        assert!(matches!(err, Error::InsufficientInputs(ref s) if s[0].required == 2_300));
    }

    #[test]
    fn duplicate_targets_are_summed() {
        let boxes = vec![token_box(1, 10, &[(token_id(0xaa), 6)]), token_box(2, 10, &[(token_id(0xaa), 6)])];
        let sel = select_boxes(&boxes, &[tok(0xaa, 4), tok(0xaa, 4)], 0).unwrap();
        assert_eq!(sel.boxes.len(), 2);
        assert_eq!(sel.change.tokens.get(&token_id(0xaa)), Some(&4));
    }

    #[test]
    fn untargeted_tokens_go_to_change() {
        let boxes = vec![token_box(1, 2_000, &[(token_id(0xcc), 9)])];
        let sel = select_boxes(&boxes, &[AssetAmount::native(1_500)], 100).unwrap();
        assert_eq!(sel.change.native, 500);
        assert_eq!(sel.change.tokens.get(&token_id(0xcc)), Some(&9));
    }

    #[test]
    fn boxes_without_needed_assets_are_skipped() {
        let boxes = vec![
            token_box(1, 1_000, &[(token_id(0xaa), 3)]),
            token_box(2, 1_000, &[(token_id(0xbb), 3)]),
            token_box(3, 1_000, &[(token_id(0xaa), 3)]),
        ];
        let sel = select_boxes(&boxes, &[tok(0xaa, 5)], 0).unwrap();
        let ids: Vec<_> = sel.boxes.iter().map(|b| b.box_id).collect();
        assert_eq!(ids, vec![boxes[0].box_id, boxes[2].box_id]);
    }

    #[test]
    fn empty_targets_select_nothing() {
        let boxes = vec![erg_box(1, 10)];
        let sel = select_boxes(&boxes, &[], 0).unwrap();
        assert!(sel.boxes.is_empty());
        assert_eq!(sel.totals, Balance::default());
    }

    #[test]
    fn result_is_deterministic_and_minimal_across_inputs() {
        let boxes: Vec<ErgoBox> = (1..=12u8)
            .map(|i| {
                let tokens = if i % 3 == 0 { vec![(token_id(0xaa), u128::from(i))] } else { vec![] };
                token_box(i, u128::from(i) * 137, &tokens)
            })
            .collect();
        for need_native in [100u128, 900, 3_000, 8_000] {
            for need_token in [0u128, 3, 12, 25] {
                let mut targets = vec![AssetAmount::native(need_native)];
                if need_token > 0 {
                    targets.push(tok(0xaa, need_token));
                }
                let all = aggregate(&boxes).unwrap();
                let feasible = all.native >= need_native + 50
                    && all.amount_of(&AssetId::Token(token_id(0xaa))) >= need_token;
                match select_boxes(&boxes, &targets, 50) {
                    Ok(sel) => {
                        assert!(feasible);
                        assert_minimal(&sel, &targets, 50);
                        assert_eq!(select_boxes(&boxes, &targets, 50).unwrap(), sel);
                    }
                    Err(Error::InsufficientInputs(_)) => assert!(!feasible),
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        }
    }
}
