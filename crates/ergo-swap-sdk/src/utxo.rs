use crate::asset::ErgoBox;
use crate::chain::IndexerBackend;
use crate::error::{Error, Result};

/// Fetch every unspent box of `address`, one page of `page_size` at a time.
///
/// Pages are requested from offset 0 and concatenated in server order until a
/// page comes back shorter than requested. Errors abort the fetch.
pub fn fetch_unspent_boxes<B: IndexerBackend + ?Sized>(
    backend: &B,
    address: &str,
    page_size: u32,
) -> Result<Vec<ErgoBox>> {
    if page_size == 0 {
        return Err(Error::Config("UTXO page size must be positive".into()));
    }
    let mut boxes = Vec::new();
    let mut offset = 0u32;
    loop {
        let page = backend.unspent_boxes_by_address(address, offset, page_size)?;
        let fetched = page.len();
        boxes.extend(page.into_iter().filter(ErgoBox::is_unspent));
        if fetched < page_size as usize {
            break;
        }
        offset = offset
            .checked_add(page_size)
            .ok_or(Error::Overflow("UTXO page offset"))?;
    }
    log::debug!("fetched {} unspent boxes for {address}", boxes.len());
    Ok(boxes)
}
