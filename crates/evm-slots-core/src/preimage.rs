//! The candidate-key pool the Explorer searches when inverting
//! keccak-derived mapping slots and guessing dynamic array indices.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::path::DecodedValue;
use crate::slot::pad32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PreimageType {
    Address,
    Uint,
    Int,
    Bool,
    FixedBytes,
    Bytes,
    String,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preimage {
    pub hex: B256,
    pub decoded: Option<DecodedValue>,
    pub ty: Option<PreimageType>,
}

/// A deduplicated, ordered pool of candidate 32-byte values.
///
/// Final ordering: typed `address` first, then other typed values, then
/// untyped ones — all stable within their group, matching insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreimagePool {
    items: Vec<Preimage>,
}

impl PreimagePool {
    pub fn builder() -> PreimagePoolBuilder {
        PreimagePoolBuilder::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preimage> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Preimages whose declared type matches `ty`, in pool order.
    pub fn typed(&self, ty: PreimageType) -> impl Iterator<Item = &Preimage> {
        self.items.iter().filter(move |p| p.ty == Some(ty))
    }

    /// Preimages with no declared type, in pool order.
    pub fn untyped(&self) -> impl Iterator<Item = &Preimage> {
        self.items.iter().filter(|p| p.ty.is_none())
    }

    /// Candidates to try for a mapping key declared as `ty`: type-matching
    /// ones first, then untyped ones, per spec's "typed-match preferred;
    /// then untyped".
    pub fn candidates_for(&self, ty: PreimageType) -> Vec<&Preimage> {
        self.typed(ty).chain(self.untyped()).collect()
    }

    pub fn addresses(&self) -> Vec<&Preimage> {
        self.typed(PreimageType::Address).collect()
    }

    /// Untyped (or otherwise) 32-byte values that parse as an integer `<=
    /// limit`, used by the dynamic-array sweep to find candidate indices.
    pub fn numeric_candidates(&self, limit: u64) -> impl Iterator<Item = u64> + '_ {
        let limit = U256::from(limit);
        self.items.iter().filter_map(move |p| {
            let value = U256::from_be_bytes(p.hex.0);
            (value <= limit).then(|| value.to::<u64>())
        })
    }
}

#[derive(Debug, Default)]
pub struct PreimagePoolBuilder {
    order: Vec<B256>,
    items: HashMap<B256, Preimage>,
}

impl PreimagePoolBuilder {
    pub fn push(mut self, hex: B256, decoded: Option<DecodedValue>, ty: Option<PreimageType>) -> Self {
        match self.items.entry(hex) {
            Entry::Vacant(slot) => {
                self.order.push(hex);
                slot.insert(Preimage { hex, decoded, ty });
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if existing.ty.is_none() && ty.is_some() {
                    existing.ty = ty;
                }
                if existing.decoded.is_none() && decoded.is_some() {
                    existing.decoded = decoded;
                }
            }
        }
        self
    }

    pub fn push_address(self, address: Address) -> Self {
        let hex = pad32(address.as_slice());
        self.push(hex, Some(DecodedValue::Address(address)), Some(PreimageType::Address))
    }

    pub fn push_raw(self, hex: B256) -> Self {
        self.push(hex, None, None)
    }

    pub fn push_typed(self, hex: B256, decoded: DecodedValue, ty: PreimageType) -> Self {
        self.push(hex, Some(decoded), Some(ty))
    }

    pub fn build(self) -> PreimagePool {
        let mut items_map = self.items;
        let mut items: Vec<Preimage> =
            self.order.into_iter().filter_map(|h| items_map.remove(&h)).collect();
        items.sort_by_key(|p| match p.ty {
            Some(PreimageType::Address) => 0u8,
            Some(_) => 1,
            None => 2,
        });
        PreimagePool { items }
    }
}
