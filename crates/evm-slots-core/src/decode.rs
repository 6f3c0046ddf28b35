//! Converts a raw 32-byte slot value plus `(type, offset, width)` into a
//! typed [`DecodedValue`].

use alloy_primitives::{Address, B256, I256, U256};

use crate::path::DecodedValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Uint,
    Int,
    Bool,
    Address,
    FixedBytes,
    Enum,
}

/// Maps a solc primitive label (`uint256`, `int8`, `bool`, `address`,
/// `bytes4`, `enum Foo.Bar`, ...) to the shape it's decoded as.
pub fn classify_primitive(name: &str) -> PrimitiveKind {
    if name == "bool" {
        PrimitiveKind::Bool
    } else if name == "address" || name == "address payable" {
        PrimitiveKind::Address
    } else if name.starts_with("enum ") {
        PrimitiveKind::Enum
    } else if name.starts_with("int") {
        PrimitiveKind::Int
    } else if name.starts_with("uint") {
        PrimitiveKind::Uint
    } else if name.starts_with("bytes") {
        PrimitiveKind::FixedBytes
    } else {
        PrimitiveKind::Uint
    }
}

/// Slices out the `width` bytes at `offset` (counted from the right, i.e.
/// the low-order end) of a 32-byte slot.
fn window_bounds(offset: u8, width: u8) -> (usize, usize) {
    let end = 32usize.saturating_sub(offset as usize);
    let start = end.saturating_sub(width as usize);
    (start, end)
}

/// The exact `width` bytes of the window, left-to-right as stored — correct
/// for fixed bytes, which are left-aligned within their own sub-range.
fn window_bytes(raw: &B256, offset: u8, width: u8) -> Vec<u8> {
    let (start, end) = window_bounds(offset, width);
    raw.as_slice()[start..end].to_vec()
}

/// The window right-aligned into a full 32-byte buffer — correct for
/// right-aligned scalar types (ints, bools, addresses).
fn window_aligned(raw: &B256, offset: u8, width: u8) -> [u8; 32] {
    let bytes = window_bytes(raw, offset, width);
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Decodes a primitive value given its declared `(offset, width)` within the
/// slot.
pub fn decode_primitive(raw: &B256, offset: u8, width: u8, kind: PrimitiveKind) -> DecodedValue {
    match kind {
        PrimitiveKind::Bool => {
            DecodedValue::Bool(window_bytes(raw, offset, width).iter().any(|b| *b != 0))
        }
        PrimitiveKind::Address => {
            let bytes = window_bytes(raw, offset, width.max(20));
            let start = bytes.len().saturating_sub(20);
            DecodedValue::Address(Address::from_slice(&bytes[start..]))
        }
        PrimitiveKind::FixedBytes => DecodedValue::FixedBytes(window_bytes(raw, offset, width)),
        PrimitiveKind::Uint | PrimitiveKind::Enum => {
            DecodedValue::Uint(U256::from_be_bytes(window_aligned(raw, offset, width)))
        }
        PrimitiveKind::Int => {
            let mut aligned = window_aligned(raw, offset, width);
            let negative = width > 0 && (aligned[32 - width as usize] & 0x80) != 0;
            if negative {
                for byte in aligned.iter_mut().take(32 - width as usize) {
                    *byte = 0xFF;
                }
            }
            DecodedValue::Int(I256::from_raw(U256::from_be_bytes(aligned)))
        }
    }
}

/// Length and content of a short (`len <= 31`) `bytes`/`string` value, whose
/// payload lives in the high bytes of the header slot.
pub struct ShortBytes {
    pub len: u8,
    pub content: Vec<u8>,
}

/// Returns `None` if `raw`'s low byte doesn't look like a short-encoding
/// header (odd low bit means long encoding).
pub fn decode_short_bytes(raw: &B256) -> Option<ShortBytes> {
    let marker = raw.as_slice()[31];
    if marker % 2 != 0 {
        return None;
    }
    let len = marker / 2;
    if len > 31 {
        return None;
    }
    Some(ShortBytes { len, content: raw.as_slice()[..len as usize].to_vec() })
}

/// Decodes the declared length from a long (`len > 31`) header slot, where
/// the low byte (and possibly more) encodes `2*len + 1`.
pub fn decode_long_length(raw: &B256) -> Option<u64> {
    let marker = raw.as_slice()[31];
    if marker % 2 == 0 {
        return None;
    }
    let value = U256::from_be_bytes(raw.0);
    let encoded: u128 = value.try_into().ok()?;
    let len = (encoded.checked_sub(1)?) / 2;
    u64::try_from(len).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_packed_uint8_pair_and_bool_and_address() {
        let mut raw = [0u8; 32];
        raw[31] = 1; // smallValue1 @ offset 0
        raw[30] = 2; // smallValue2 @ offset 1
        raw[29] = 1; // flag @ offset 2
        let addr = [0xCAu8; 20];
        raw[9..29].copy_from_slice(&addr);
        let raw = B256::from(raw);

        assert_eq!(decode_primitive(&raw, 0, 1, PrimitiveKind::Uint), DecodedValue::Uint(U256::from(1u64)));
        assert_eq!(decode_primitive(&raw, 1, 1, PrimitiveKind::Uint), DecodedValue::Uint(U256::from(2u64)));
        assert_eq!(decode_primitive(&raw, 2, 1, PrimitiveKind::Bool), DecodedValue::Bool(true));
        assert_eq!(
            decode_primitive(&raw, 3, 20, PrimitiveKind::Address),
            DecodedValue::Address(Address::from_slice(&addr))
        );
    }

    #[test]
    fn decodes_negative_int8() {
        let mut raw = [0u8; 32];
        raw[31] = 0xFF; // -1 as int8
        let value = decode_primitive(&B256::from(raw), 0, 1, PrimitiveKind::Int);
        assert_eq!(value, DecodedValue::Int(I256::MINUS_ONE));
    }

    #[test]
    fn decodes_short_string() {
        let mut raw = [0u8; 32];
        raw[..3].copy_from_slice(b"hi!");
        raw[31] = 6; // len 3, short marker
        let short = decode_short_bytes(&B256::from(raw)).unwrap();
        assert_eq!(short.len, 3);
        assert_eq!(short.content, b"hi!");
    }

    #[test]
    fn decodes_long_length_header() {
        let len = 180u64;
        let marker = U256::from(len * 2 + 1);
        let raw = B256::from(marker.to_be_bytes::<32>());
        assert_eq!(decode_long_length(&raw), Some(180));
    }
}
