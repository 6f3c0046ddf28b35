//! Pure Solidity storage slot derivation. No I/O, no fallible paths beyond
//! the 256-bit modulus the EVM itself wraps on.

use alloy_primitives::{keccak256, B256, U256};

/// `keccak256(key ‖ base)`, Solidity's derivation for `mapping(K => V)` slots.
pub fn mapping_slot(base: U256, key: B256) -> U256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(key.as_slice());
    buf[32..].copy_from_slice(&base.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

/// `keccak256(base)`, the first data slot of a `bytes`/`string`/dynamic array.
pub fn dyn_array_data_base(base: U256) -> U256 {
    U256::from_be_bytes(keccak256(base.to_be_bytes::<32>()).0)
}

/// `keccak256(header_slot)`, alias of [`dyn_array_data_base`] kept distinct
/// for readability at call sites that deal with long bytes/string headers.
pub fn long_bytes_data_base(header_slot: U256) -> U256 {
    dyn_array_data_base(header_slot)
}

/// `base + slot_in_struct`, wrapping like the EVM does.
pub fn struct_field_slot(base: U256, slot_in_struct: u64) -> U256 {
    base.wrapping_add(U256::from(slot_in_struct))
}

/// Location of element `index` of a packed-aware array (static or dynamic)
/// whose elements are `stride` bytes wide, starting at `data_base`.
///
/// Returns `(slot, byte_offset)`. When `stride <= 32` several elements share
/// a slot; otherwise each element spans `ceil(stride/32)` slots.
pub fn element_location(data_base: U256, index: u64, stride: u32) -> (U256, u8) {
    let stride = stride.max(1);
    if stride <= 32 {
        let per_slot = (32 / stride).max(1) as u64;
        let slot_offset = index / per_slot;
        let byte_offset = ((index % per_slot) as u32 * stride) as u8;
        (data_base.wrapping_add(U256::from(slot_offset)), byte_offset)
    } else {
        let slots_per_elem = u64::from(stride.div_ceil(32));
        (data_base.wrapping_add(U256::from(index) * U256::from(slots_per_elem)), 0)
    }
}

/// Left-pads an address (or any byte string up to 32 bytes) into a full slot
/// word, the way the EVM pads mapping keys and ABI words.
pub fn pad32(bytes: &[u8]) -> B256 {
    let mut out = [0u8; 32];
    let len = bytes.len().min(32);
    out[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    B256::from(out)
}
