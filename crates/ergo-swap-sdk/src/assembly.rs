use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::asset::{Amount, AssetId, BoxId, ErgoBox, MAX_LONG, TokenId, TxId};
use crate::error::{Error, Result};
use crate::order::FundedOrder;
use crate::sigma;

/// ErgoTree of the standard miner fee box.
pub const MINER_FEE_TREE: &str = "1005040004000e36100204a00b08cd0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798ea02d192a39a8cc7a701730073011001020402d19683030193a38cc7b2a57300000193c2b2a57301007473027303830108cdeeac93b1a57304";

/// Per-request chain context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkContext {
    pub height: u32,
    pub self_address: String,
    pub change_address: String,
    pub miner_fee: Amount,
}

/// ErgoTrees the swap transaction pays to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTrees {
    /// Swap-order contract locking the order box.
    pub order_contract: String,
    /// Receives the swap output once the order executes.
    pub redeemer: String,
    pub change: String,
}

// ── Transaction shapes (node JSON) ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedInput {
    pub box_id: BoxId,
    /// Context extension; always empty for wallet inputs.
    pub extension: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataInput {
    pub box_id: BoxId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEntry {
    pub token_id: TokenId,
    pub amount: u64,
}

/// An output before it is included in a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxCandidate {
    pub value: u64,
    pub ergo_tree: String,
    pub assets: Vec<TokenEntry>,
    pub additional_registers: BTreeMap<String, String>,
    pub creation_height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    pub inputs: Vec<UnsignedInput>,
    pub data_inputs: Vec<DataInput>,
    pub outputs: Vec<BoxCandidate>,
}

/// Serialized signed transaction as produced by a prover.
///
/// `bytes` are handed to the node exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub id: Option<TxId>,
    pub bytes: Vec<u8>,
}

#[derive(Deserialize)]
struct SignedId {
    id: TxId,
}

impl SignedTransaction {
    /// Wrap a node-JSON signed transaction, reading its id when present.
    pub fn from_json_bytes(bytes: Vec<u8>) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Decode(format!("signed transaction: {e}")))?;
        let id = serde_json::from_value::<SignedId>(value).ok().map(|s| s.id);
        Ok(Self { id, bytes })
    }
}

// ── Assembly ────────────────────────────────────────────────────────────

fn to_long(v: Amount, what: &'static str) -> Result<u64> {
    if v > MAX_LONG {
        return Err(Error::Overflow(what));
    }
    u64::try_from(v).map_err(|_| Error::Overflow(what))
}

fn long_register(v: Amount, what: &'static str) -> Result<String> {
    let v = i64::try_from(v).map_err(|_| Error::Overflow(what))?;
    Ok(sigma::encode_long(v))
}

fn tree_bytes(tree: &str, what: &str) -> Result<Vec<u8>> {
    hex::decode(tree).map_err(|e| Error::Decode(format!("{what} ErgoTree: {e}")))
}

fn order_registers(funded: &FundedOrder, redeemer: &str) -> Result<BTreeMap<String, String>> {
    let order = &funded.order;
    let ext = &order.extremes;
    let mut regs = BTreeMap::new();
    regs.insert(
        "R4".to_string(),
        sigma::encode_coll_byte(order.pool_id.as_bytes()),
    );
    regs.insert(
        "R5".to_string(),
        sigma::encode_coll_byte(&tree_bytes(redeemer, "redeemer")?),
    );
    regs.insert(
        "R6".to_string(),
        long_register(ext.min_output.amount, "minimum output")?,
    );
    regs.insert(
        "R7".to_string(),
        long_register(ext.max_ex_fee, "maximum exchange fee")?,
    );
    regs.insert(
        "R8".to_string(),
        long_register(ext.ex_fee_per_token.num, "fee per token numerator")?,
    );
    regs.insert(
        "R9".to_string(),
        long_register(ext.ex_fee_per_token.denom, "fee per token denominator")?,
    );
    Ok(regs)
}

fn token_entries(tokens: &BTreeMap<TokenId, Amount>) -> Result<Vec<TokenEntry>> {
    tokens
        .iter()
        .map(|(id, amount)| {
            Ok(TokenEntry {
                token_id: *id,
                amount: to_long(*amount, "token amount")?,
            })
        })
        .collect()
}

/// Build the unsigned swap transaction for a funded order.
///
/// Outputs are, in order: the order box, a change box when anything is left
/// over, and the miner fee box. Inputs are the selected boxes in selection
/// order. Native value and every token are conserved exactly.
pub fn assemble_swap(
    funded: &FundedOrder,
    ctx: &NetworkContext,
    trees: &OutputTrees,
) -> Result<UnsignedTransaction> {
    if ctx.miner_fee != funded.tx_fee() {
        return Err(Error::ConservationViolation(format!(
            "order was funded for a miner fee of {}, context has {}",
            funded.tx_fee(),
            ctx.miner_fee
        )));
    }
    tree_bytes(&trees.order_contract, "order contract")?;
    tree_bytes(&trees.change, "change")?;

    let order = &funded.order;
    let mut order_tokens = BTreeMap::new();
    if let AssetId::Token(id) = order.input.id() {
        order_tokens.insert(id, order.input.amount);
    }
    let order_box = BoxCandidate {
        value: to_long(funded.order_box_value, "order box value")?,
        ergo_tree: trees.order_contract.clone(),
        assets: token_entries(&order_tokens)?,
        additional_registers: order_registers(funded, &trees.redeemer)?,
        creation_height: ctx.height,
    };

    let mut outputs = vec![order_box];

    let change = &funded.selection.change;
    if change.native > 0 || !change.tokens.is_empty() {
        if change.native < funded.min_box_value {
            return Err(Error::ConservationViolation(format!(
                "change of {} nanoERG is below the minimum box value {}",
                change.native, funded.min_box_value
            )));
        }
        outputs.push(BoxCandidate {
            value: to_long(change.native, "change value")?,
            ergo_tree: trees.change.clone(),
            assets: token_entries(&change.tokens)?,
            additional_registers: BTreeMap::new(),
            creation_height: ctx.height,
        });
    }

    outputs.push(BoxCandidate {
        value: to_long(ctx.miner_fee, "miner fee")?,
        ergo_tree: MINER_FEE_TREE.to_string(),
        assets: Vec::new(),
        additional_registers: BTreeMap::new(),
        creation_height: ctx.height,
    });

    let tx = UnsignedTransaction {
        inputs: funded
            .selection
            .boxes
            .iter()
            .map(|b| UnsignedInput {
                box_id: b.box_id,
                extension: BTreeMap::new(),
            })
            .collect(),
        data_inputs: Vec::new(),
        outputs,
    };
    check_conservation(&funded.selection.boxes, &tx)?;
    Ok(tx)
}

/// Verify that `tx` spends exactly what `inputs` hold.
pub fn check_conservation(inputs: &[ErgoBox], tx: &UnsignedTransaction) -> Result<()> {
    let mut native_in: Amount = 0;
    let mut tokens_in: BTreeMap<TokenId, Amount> = BTreeMap::new();
    for b in inputs {
        native_in = native_in
            .checked_add(b.value)
            .ok_or(Error::Overflow("input value"))?;
        for a in &b.assets {
            if let AssetId::Token(id) = a.id() {
                let t = tokens_in.entry(id).or_insert(0);
                *t = t.checked_add(a.amount).ok_or(Error::Overflow("input tokens"))?;
            }
        }
    }

    let mut native_out: Amount = 0;
    let mut tokens_out: BTreeMap<TokenId, Amount> = BTreeMap::new();
    for o in &tx.outputs {
        native_out = native_out
            .checked_add(Amount::from(o.value))
            .ok_or(Error::Overflow("output value"))?;
        for t in &o.assets {
            let e = tokens_out.entry(t.token_id).or_insert(0);
            *e = e
                .checked_add(Amount::from(t.amount))
                .ok_or(Error::Overflow("output tokens"))?;
        }
    }

    if native_in != native_out {
        return Err(Error::ConservationViolation(format!(
            "inputs hold {native_in} nanoERG, outputs {native_out}"
        )));
    }
    if tokens_in != tokens_out {
        return Err(Error::ConservationViolation(
            "token totals differ between inputs and outputs".into(),
        ));
    }
    Ok(())
}
