//! Sigma constant serialization for the register types the engine touches.
//!
//! A serialized constant is a type code followed by the value. Integers are
//! ZigZag-mapped and written as unsigned VLQ; byte collections are a VLQ
//! length followed by the raw bytes.

use crate::error::{Error, Result};

const TYPE_INT: u8 = 0x04;
const TYPE_LONG: u8 = 0x05;
const TYPE_COLL_BYTE: u8 = 0x0e;

fn put_vlq(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8 & 0x7f) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn get_vlq(bytes: &[u8], pos: &mut usize) -> Result<u64> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    loop {
        let b = *bytes
            .get(*pos)
            .ok_or_else(|| Error::Decode("truncated VLQ".into()))?;
        *pos += 1;
        if shift >= 64 {
            return Err(Error::Decode("VLQ longer than 64 bits".into()));
        }
        result |= u64::from(b & 0x7f) << shift;
        if b & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

fn zigzag_i64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

fn expect_type(bytes: &[u8], code: u8, name: &str) -> Result<usize> {
    match bytes.first() {
        Some(&c) if c == code => Ok(1),
        Some(&c) => Err(Error::Decode(format!(
            "expected {name} constant (type 0x{code:02x}), found type 0x{c:02x}"
        ))),
        None => Err(Error::Decode(format!("empty {name} constant"))),
    }
}

fn ensure_consumed(bytes: &[u8], pos: usize) -> Result<()> {
    if pos != bytes.len() {
        return Err(Error::Decode(format!(
            "{} trailing bytes after constant",
            bytes.len() - pos
        )));
    }
    Ok(())
}

fn decode_hex(hex_str: &str) -> Result<Vec<u8>> {
    hex::decode(hex_str).map_err(|e| Error::Decode(format!("bad constant hex: {e}")))
}

/// Serialize an `Int` constant to hex.
pub fn encode_int(v: i32) -> String {
    let mut out = vec![TYPE_INT];
    put_vlq(&mut out, zigzag_i64(i64::from(v)));
    hex::encode(out)
}

/// Serialize a `Long` constant to hex.
pub fn encode_long(v: i64) -> String {
    let mut out = vec![TYPE_LONG];
    put_vlq(&mut out, zigzag_i64(v));
    hex::encode(out)
}

/// Serialize a `Coll[Byte]` constant to hex.
pub fn encode_coll_byte(bytes: &[u8]) -> String {
    let mut out = Vec::with_capacity(bytes.len() + 3);
    out.push(TYPE_COLL_BYTE);
    put_vlq(&mut out, bytes.len() as u64);
    out.extend_from_slice(bytes);
    hex::encode(out)
}

/// Decode a hex-serialized `Int` constant.
pub fn decode_int(hex_str: &str) -> Result<i32> {
    let bytes = decode_hex(hex_str)?;
    let mut pos = expect_type(&bytes, TYPE_INT, "Int")?;
    let v = unzigzag(get_vlq(&bytes, &mut pos)?);
    ensure_consumed(&bytes, pos)?;
    i32::try_from(v).map_err(|_| Error::Decode(format!("Int constant {v} out of range")))
}

/// Decode a hex-serialized `Long` constant.
pub fn decode_long(hex_str: &str) -> Result<i64> {
    let bytes = decode_hex(hex_str)?;
    let mut pos = expect_type(&bytes, TYPE_LONG, "Long")?;
    let v = unzigzag(get_vlq(&bytes, &mut pos)?);
    ensure_consumed(&bytes, pos)?;
    Ok(v)
}

/// Decode a hex-serialized `Coll[Byte]` constant.
pub fn decode_coll_byte(hex_str: &str) -> Result<Vec<u8>> {
    let bytes = decode_hex(hex_str)?;
    let mut pos = expect_type(&bytes, TYPE_COLL_BYTE, "Coll[Byte]")?;
    let len = usize::try_from(get_vlq(&bytes, &mut pos)?)
        .map_err(|_| Error::Decode("Coll[Byte] length overflow".into()))?;
    let end = pos
        .checked_add(len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| Error::Decode("truncated Coll[Byte]".into()))?;
    let value = bytes[pos..end].to_vec();
    ensure_consumed(&bytes, end)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_fee_register_vector() {
        // R4 of every 0.3% fee pool box.
        assert_eq!(encode_int(997), "04ca0f");
        assert_eq!(decode_int("04ca0f").unwrap(), 997);
    }

    #[test]
    fn long_vectors() {
        assert_eq!(encode_long(0), "0500");
        assert_eq!(encode_long(1), "0502");
        assert_eq!(encode_long(-1), "0501");
        assert_eq!(encode_long(1000), "05d00f");
        for v in [0, 1, -1, 63, 64, -65, 1_000_000_007, i64::MAX, i64::MIN] {
            assert_eq!(decode_long(&encode_long(v)).unwrap(), v);
        }
    }

    #[test]
    fn coll_byte_vectors() {
        assert_eq!(encode_coll_byte(&[0xab, 0xcd]), "0e02abcd");
        let long = vec![0x5a; 200];
        let encoded = encode_coll_byte(&long);
        assert!(encoded.starts_with("0ec801"));
        assert_eq!(decode_coll_byte(&encoded).unwrap(), long);
    }

    #[test]
    fn decode_rejects_wrong_type_and_truncation() {
        assert!(decode_int("0502").is_err());
        assert!(decode_long("05").is_err());
        assert!(decode_long("05ff").is_err());
        assert!(decode_coll_byte("0e05abcd").is_err());
        assert!(decode_int("04ca0f00").is_err());
        assert!(decode_int("").is_err());
    }
}
