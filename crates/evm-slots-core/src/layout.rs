//! Normalized in-memory representation of a Solidity storage layout.
//!
//! [`StorageLayout::from_json`] accepts the shape solc emits under
//! `storageLayout` in its standard-json output: a `storage` array of
//! declared variables and a `types` map keyed by internal type id
//! (`t_uint256`, `t_mapping(t_address,t_uint256)`, ...).

use std::collections::BTreeMap;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

pub type TypeId = String;

/// A normalized storage layout for one contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageLayout {
    pub storage: Vec<LayoutVariable>,
    pub types: BTreeMap<TypeId, TypeDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutVariable {
    pub label: String,
    pub slot: U256,
    pub offset: u8,
    pub type_id: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BytesKind {
    Bytes,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub label: String,
    pub slot_in_struct: u64,
    pub offset: u8,
    pub type_id: TypeId,
}

/// A resolved Solidity type, tagged by its storage encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Primitive { name: String, byte_width: u8 },
    Bytes { kind: BytesKind },
    StaticArray { base_type_id: TypeId, length: u64, stride: u32 },
    DynamicArray { base_type_id: TypeId },
    Mapping { key_type_id: TypeId, value_type_id: TypeId },
    Struct { fields: Vec<StructField>, byte_width: u32 },
}

impl StorageLayout {
    pub fn type_of(&self, type_id: &str) -> Option<&TypeDef> {
        self.types.get(type_id)
    }

    /// Parses a solc-shaped `storageLayout` JSON document.
    pub fn from_json(raw: &str) -> Result<Self, LayoutError> {
        let raw: raw::RawStorageLayout = serde_json::from_str(raw)?;
        raw.normalize()
    }

    /// Adds the EIP-1967 implementation/admin pseudo-variables to the layout
    /// if they are not already declared. This is a pure, data-only helper —
    /// deciding *whether* a contract is a proxy is left to the layout
    /// provider.
    pub fn augment_with_proxy_slots(mut self) -> Self {
        const IMPLEMENTATION_SLOT: &str =
            "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";
        const ADMIN_SLOT: &str = "0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103";

        self.types.entry("t_address".to_string()).or_insert(TypeDef::Primitive {
            name: "address".to_string(),
            byte_width: 20,
        });

        for (label, hex_slot) in [("__implementation", IMPLEMENTATION_SLOT), ("__admin", ADMIN_SLOT)] {
            if self.storage.iter().any(|v| v.label == label) {
                continue;
            }
            if let Ok(slot) = U256::from_str_radix(hex_slot.trim_start_matches("0x"), 16) {
                self.storage.push(LayoutVariable {
                    label: label.to_string(),
                    slot,
                    offset: 0,
                    type_id: "t_address".to_string(),
                });
            }
        }
        self
    }
}

mod raw {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::{BytesKind, LayoutVariable, StorageLayout, StructField, TypeDef};
    use crate::error::LayoutError;

    #[derive(Debug, Deserialize)]
    pub struct RawStorageLayout {
        pub storage: Vec<RawEntry>,
        pub types: BTreeMap<String, RawTypeDef>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RawEntry {
        pub label: String,
        pub slot: String,
        pub offset: u8,
        #[serde(rename = "type")]
        pub type_id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct RawTypeDef {
        pub encoding: String,
        pub label: String,
        #[serde(rename = "numberOfBytes")]
        pub number_of_bytes: String,
        #[serde(default)]
        pub key: Option<String>,
        #[serde(default)]
        pub value: Option<String>,
        #[serde(default)]
        pub base: Option<String>,
        #[serde(default)]
        pub members: Option<Vec<RawEntry>>,
    }

    impl RawStorageLayout {
        pub fn normalize(self) -> Result<StorageLayout, LayoutError> {
            let mut types = BTreeMap::new();
            for (id, raw) in &self.types {
                types.insert(id.clone(), normalize_type(id, raw, &self.types)?);
            }

            let storage = self
                .storage
                .into_iter()
                .map(|e| {
                    Ok(LayoutVariable {
                        label: e.label,
                        slot: parse_u256(&e.slot)?,
                        offset: e.offset,
                        type_id: e.type_id,
                    })
                })
                .collect::<Result<Vec<_>, LayoutError>>()?;

            Ok(StorageLayout { storage, types })
        }
    }

    fn parse_u256(s: &str) -> Result<alloy_primitives::U256, LayoutError> {
        alloy_primitives::U256::from_str_radix(s, 10)
            .map_err(|_| LayoutError::InvalidSlot(s.to_string()))
    }

    fn raw_number_of_bytes(types: &BTreeMap<String, RawTypeDef>, type_id: &str) -> u32 {
        types
            .get(type_id)
            .and_then(|t| t.number_of_bytes.parse::<u32>().ok())
            .unwrap_or(32)
    }

    fn array_length(label: &str, type_id: &str) -> Result<u64, LayoutError> {
        let start = label.rfind('[').ok_or_else(|| LayoutError::MissingArrayLength(type_id.to_string()))?;
        let end = label.rfind(']').ok_or_else(|| LayoutError::MissingArrayLength(type_id.to_string()))?;
        label[start + 1..end]
            .parse::<u64>()
            .map_err(|_| LayoutError::MissingArrayLength(type_id.to_string()))
    }

    fn normalize_type(
        id: &str,
        raw: &RawTypeDef,
        all: &BTreeMap<String, RawTypeDef>,
    ) -> Result<TypeDef, LayoutError> {
        let byte_width = raw_number_of_bytes(all, id);
        match raw.encoding.as_str() {
            "mapping" => Ok(TypeDef::Mapping {
                key_type_id: raw.key.clone().ok_or_else(|| LayoutError::UnknownType(id.to_string()))?,
                value_type_id: raw
                    .value
                    .clone()
                    .ok_or_else(|| LayoutError::UnknownType(id.to_string()))?,
            }),
            "dynamic_array" => Ok(TypeDef::DynamicArray {
                base_type_id: raw.base.clone().ok_or_else(|| LayoutError::UnknownType(id.to_string()))?,
            }),
            "bytes" => Ok(TypeDef::Bytes {
                kind: if raw.label == "string" { BytesKind::String } else { BytesKind::Bytes },
            }),
            "inplace" => {
                if let Some(members) = &raw.members {
                    let fields = members
                        .iter()
                        .map(|m| {
                            Ok(StructField {
                                label: m.label.clone(),
                                slot_in_struct: m.slot.parse::<u64>().unwrap_or(0),
                                offset: m.offset,
                                type_id: m.type_id.clone(),
                            })
                        })
                        .collect::<Result<Vec<_>, LayoutError>>()?;
                    Ok(TypeDef::Struct { fields, byte_width })
                } else if let Some(base) = &raw.base {
                    let length = array_length(&raw.label, id)?;
                    let base_width = raw_number_of_bytes(all, base);
                    let stride =
                        if base_width <= 32 { base_width } else { base_width.div_ceil(32) * 32 };
                    Ok(TypeDef::StaticArray { base_type_id: base.clone(), length, stride })
                } else {
                    Ok(TypeDef::Primitive { name: raw.label.clone(), byte_width: byte_width as u8 })
                }
            }
            other => Err(LayoutError::UnknownEncoding(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_mapping_layout() {
        let json = r#"{
            "storage": [{"label": "balances", "slot": "0", "offset": 0, "type": "t_mapping(t_address,t_uint256)"}],
            "types": {
                "t_mapping(t_address,t_uint256)": {"encoding": "mapping", "label": "mapping(address => uint256)", "numberOfBytes": "32", "key": "t_address", "value": "t_uint256"},
                "t_address": {"encoding": "inplace", "label": "address", "numberOfBytes": "20"},
                "t_uint256": {"encoding": "inplace", "label": "uint256", "numberOfBytes": "32"}
            }
        }"#;
        let layout = StorageLayout::from_json(json).unwrap();
        assert_eq!(layout.storage.len(), 1);
        assert_eq!(layout.storage[0].label, "balances");
        assert!(matches!(
            layout.type_of("t_mapping(t_address,t_uint256)"),
            Some(TypeDef::Mapping { .. })
        ));
    }

    #[test]
    fn parses_static_array_length_and_stride() {
        let json = r#"{
            "storage": [{"label": "fixed", "slot": "0", "offset": 0, "type": "t_array(t_uint8)3_storage"}],
            "types": {
                "t_array(t_uint8)3_storage": {"encoding": "inplace", "label": "uint8[3]", "numberOfBytes": "3", "base": "t_uint8"},
                "t_uint8": {"encoding": "inplace", "label": "uint8", "numberOfBytes": "1"}
            }
        }"#;
        let layout = StorageLayout::from_json(json).unwrap();
        match layout.type_of("t_array(t_uint8)3_storage").unwrap() {
            TypeDef::StaticArray { length, stride, .. } => {
                assert_eq!(*length, 3);
                assert_eq!(*stride, 1);
            }
            other => panic!("unexpected type: {other:?}"),
        }
    }

    #[test]
    fn augments_proxy_slots_once() {
        let layout = StorageLayout::default().augment_with_proxy_slots().augment_with_proxy_slots();
        assert_eq!(layout.storage.iter().filter(|v| v.label == "__implementation").count(), 1);
        assert_eq!(layout.storage.iter().filter(|v| v.label == "__admin").count(), 1);
    }
}
