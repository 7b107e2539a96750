//! Value types for assets, amounts and boxes.
//!
//! Every on-chain quantity is an [`Amount`] (`u128`) of integral base units.
//! Conversion to human-readable decimals lives in [`crate::units`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Integral base-unit quantity of any asset (nanoERG for the native asset).
pub type Amount = u128;

/// Decimals of the native asset (1 ERG = 10^9 nanoERG).
pub const ERG_DECIMALS: u8 = 9;

/// Ticker used for the native asset at the boundary.
pub const ERG_SYMBOL: &str = "ERG";

/// Largest value a ledger `Long` register or box value can carry.
pub const MAX_LONG: Amount = i64::MAX as Amount;

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let bytes = hex::decode(s)
                    .map_err(|e| Error::Decode(format!("bad {} {s:?}: {e}", stringify!($name))))?;
                let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
                    Error::Decode(format!("{} must be 32 bytes", stringify!($name)))
                })?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_id!(
    /// Identifier of a non-native token (the id of the box that minted it).
    TokenId
);
hex_id!(
    /// Identifier of a box (UTXO).
    BoxId
);
hex_id!(
    /// Identifier of a transaction.
    TxId
);

// ── Assets ──────────────────────────────────────────────────────────────

/// Either the native currency or a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetId {
    Native,
    Token(TokenId),
}

impl AssetId {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetId::Native)
    }

    pub fn token(&self) -> Option<&TokenId> {
        match self {
            AssetId::Native => None,
            AssetId::Token(id) => Some(id),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Native => f.write_str(ERG_SYMBOL),
            AssetId::Token(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for AssetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case(ERG_SYMBOL) {
            Ok(AssetId::Native)
        } else {
            Ok(AssetId::Token(s.parse()?))
        }
    }
}

impl From<TokenId> for AssetId {
    fn from(id: TokenId) -> Self {
        AssetId::Token(id)
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An asset and the number of decimals it is displayed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub decimals: u8,
}

impl Asset {
    pub const fn native() -> Self {
        Self {
            id: AssetId::Native,
            decimals: ERG_DECIMALS,
        }
    }

    pub const fn token(id: TokenId, decimals: u8) -> Self {
        Self {
            id: AssetId::Token(id),
            decimals,
        }
    }
}

/// A quantity of one asset in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset: Asset,
    pub amount: Amount,
}

impl AssetAmount {
    pub const fn new(asset: Asset, amount: Amount) -> Self {
        Self { asset, amount }
    }

    pub const fn native(amount: Amount) -> Self {
        Self::new(Asset::native(), amount)
    }

    pub fn id(&self) -> AssetId {
        self.asset.id
    }

    pub fn with_amount(&self, amount: Amount) -> Self {
        Self::new(self.asset, amount)
    }
}

// ── Boxes ───────────────────────────────────────────────────────────────

/// An unspent transaction output as reported by the indexer.
///
/// `value` is the native amount; `assets` holds token entries in the order the
/// ledger stores them. The engine never mutates a box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErgoBox {
    pub box_id: BoxId,
    pub value: Amount,
    /// Hex-encoded serialized ErgoTree of the owner.
    pub ergo_tree: String,
    pub assets: Vec<AssetAmount>,
    pub creation_height: u32,
    pub transaction_id: TxId,
    pub index: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spent_transaction_id: Option<TxId>,
    pub inclusion_height: u32,
    pub global_index: u64,
    /// Register id (`"R4"`..`"R9"`) to hex-encoded serialized constant.
    #[serde(default)]
    pub additional_registers: BTreeMap<String, String>,
}

impl ErgoBox {
    pub fn is_unspent(&self) -> bool {
        self.spent_transaction_id.is_none()
    }

    /// Amount of `asset` carried by this box (native value or summed token entries).
    pub fn amount_of(&self, asset: &AssetId) -> Amount {
        match asset {
            AssetId::Native => self.value,
            AssetId::Token(_) => self
                .assets
                .iter()
                .filter(|a| a.asset.id == *asset)
                .map(|a| a.amount)
                .sum(),
        }
    }

    pub fn register(&self, id: &str) -> Option<&str> {
        self.additional_registers.get(id).map(String::as_str)
    }
}
