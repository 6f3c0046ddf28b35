//! The shapes an [`crate::explorer`] run produces: path segments, decoded
//! values, and the per-variable access records they compose into.

use alloy_primitives::{Address, B256, I256, U256};
use serde::{Deserialize, Serialize};

use crate::preimage::PreimageType;

/// One decoded Solidity value, width-erased from the raw 32-byte slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedValue {
    Uint(U256),
    Int(I256),
    Bool(bool),
    Address(Address),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
}

impl DecodedValue {
    /// Compact rendering used inside `full_expression`, e.g. `0xcafe…` for an
    /// address or `42` for an integer. Addresses are always lowercase, never
    /// checksummed (slots are compared and emitted in lowercase hex).
    pub fn compact(&self) -> String {
        match self {
            DecodedValue::Uint(v) => v.to_string(),
            DecodedValue::Int(v) => v.to_string(),
            DecodedValue::Bool(v) => v.to_string(),
            DecodedValue::Address(a) => format!("0x{}", alloy_primitives::hex::encode(a.as_slice())),
            DecodedValue::FixedBytes(b) | DecodedValue::Bytes(b) => {
                format!("0x{}", alloy_primitives::hex::encode(b))
            }
            DecodedValue::String(s) => s.clone(),
        }
    }
}

/// One step of a variable's source-level path, e.g. the `[0xCAFE…]` in
/// `balances[0xCAFE…]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathSegment {
    MappingKey { key_hex: String, key_decoded: Option<DecodedValue>, key_type: Option<PreimageType> },
    ArrayIndex { index: u64 },
    ArrayLength,
    BytesLength,
    StructField { name: String },
}

/// A decoded 32-byte word, with its raw hex kept alongside the typed value
/// so a caller can always fall back to the bytes when decoding fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotValue {
    pub hex: B256,
    pub decoded: Option<DecodedValue>,
}

impl SlotValue {
    pub fn new(hex: B256, decoded: Option<DecodedValue>) -> Self {
        Self { hex, decoded }
    }
}

/// One observation of a variable (or one path into it) during a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub slots: Vec<B256>,
    pub path: Vec<PathSegment>,
    pub full_expression: String,
    pub current: SlotValue,
    pub next: Option<SlotValue>,
    pub modified: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    Primitive,
    Mapping,
    DynamicArray,
    StaticArray,
    Struct,
    Bytes,
}

/// All the access records gathered for one declared (or synthetic,
/// unlabeled) variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledVariable {
    pub name: String,
    pub type_name: String,
    pub kind: VariableKind,
    pub trace: Vec<AccessRecord>,
}

/// Renders `name` plus `path` in canonical Solidity syntax:
/// `name[k1][k2].field[3]._length`.
pub fn compose_expression(name: &str, path: &[PathSegment]) -> String {
    let mut out = String::from(name);
    for segment in path {
        match segment {
            PathSegment::MappingKey { key_hex, key_decoded, .. } => {
                let key = key_decoded.as_ref().map(DecodedValue::compact).unwrap_or_else(|| key_hex.clone());
                out.push('[');
                out.push_str(&key);
                out.push(']');
            }
            PathSegment::ArrayIndex { index } => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
            PathSegment::ArrayLength | PathSegment::BytesLength => out.push_str("._length"),
            PathSegment::StructField { name } => {
                out.push('.');
                out.push_str(name);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_nested_mapping_and_struct_path() {
        let path = vec![
            PathSegment::MappingKey {
                key_hex: "0x00".into(),
                key_decoded: Some(DecodedValue::Address(Address::repeat_byte(0xaa))),
                key_type: Some(PreimageType::Address),
            },
            PathSegment::StructField { name: "purchases".into() },
            PathSegment::ArrayIndex { index: 3 },
        ];
        assert_eq!(
            compose_expression("users", &path),
            "users[0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa].purchases[3]"
        );
    }

    #[test]
    fn composes_length_pseudo_segments() {
        assert_eq!(compose_expression("values", &[PathSegment::ArrayLength]), "values._length");
        assert_eq!(compose_expression("name", &[PathSegment::BytesLength]), "name._length");
    }
}
