//! Token metadata and user-facing asset resolution.

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, AssetId, ERG_SYMBOL, TokenId};
use crate::chain::IndexerBackend;
use crate::error::{Error, Result};

/// Registry metadata of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub id: TokenId,
    pub name: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn asset(&self) -> Asset {
        Asset::token(self.id, self.decimals)
    }
}

/// Resolve `"ERG"`, a 64-char token id, or an exact (case-insensitive) token
/// name into an [`Asset`] with its registry decimals.
///
/// A name matching several tokens is ambiguous and rejected.
pub fn resolve_asset<B: IndexerBackend + ?Sized>(backend: &B, query: &str) -> Result<Asset> {
    let query = query.trim();
    if query.eq_ignore_ascii_case(ERG_SYMBOL) {
        return Ok(Asset::native());
    }
    if let Ok(id) = query.parse::<TokenId>() {
        return Ok(backend.token_info(&id)?.asset());
    }

    let matches: Vec<TokenInfo> = backend
        .search_tokens(query)?
        .into_iter()
        .filter(|t| t.name.eq_ignore_ascii_case(query))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.asset()),
        [] => Err(Error::UnknownAsset(format!("no token named {query:?}"))),
        many => Err(Error::UnknownAsset(format!(
            "token name {query:?} is ambiguous: {}",
            many.iter()
                .map(|t| t.id.to_hex())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Display symbol for `asset`, falling back to `None` for unnamed tokens.
pub fn symbol_of<B: IndexerBackend + ?Sized>(backend: &B, asset: &AssetId) -> Option<String> {
    match asset {
        AssetId::Native => Some(ERG_SYMBOL.to_string()),
        AssetId::Token(id) => match backend.token_info(id) {
            Ok(info) if !info.name.is_empty() => Some(info.name),
            Ok(_) => None,
            Err(e) => {
                log::debug!("no metadata for token {id}: {e}");
                None
            }
        },
    }
}
