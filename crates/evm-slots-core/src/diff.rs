//! Converts a raw, provider-shaped account diff into the inputs the
//! [`crate::explorer`] actually needs: an [`ObservedSlots`] map plus whatever
//! non-storage (intrinsic) fields changed.
//!
//! This module is deliberately pure — it does not know how to fetch a diff,
//! only how to normalize one once it has it. Fetching lives behind a
//! provider trait one layer up.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::explorer::{ObservedSlot, ObservedSlots};

/// One slot's raw pre/post value as reported by a diff oracle. `pre` is
/// `None` when the slot reads as zero before the transaction (e.g. a slot
/// first written on a freshly created account) — the adapter normalizes
/// that into an explicit zero rather than leaving it ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSlotDiff {
    pub pre: Option<B256>,
    pub post: B256,
}

/// Before/after of one intrinsic (non-storage) account field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff<T> {
    pub before: T,
    pub after: T,
}

impl<T: PartialEq> FieldDiff<T> {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// The raw shape a diff provider hands back for one touched account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAccountDiff {
    pub address: Address,
    pub storage: BTreeMap<B256, RawSlotDiff>,
    pub nonce: Option<FieldDiff<u64>>,
    pub balance: Option<FieldDiff<U256>>,
    pub code: Option<FieldDiff<Vec<u8>>>,
}

/// Non-storage account state that changed in the same transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntrinsicsDiff {
    pub nonce: Option<FieldDiff<u64>>,
    pub balance: Option<FieldDiff<U256>>,
    pub code_changed: bool,
}

/// One account's fully normalized observation, ready for [`crate::explorer::explore`].
#[derive(Debug, Clone)]
pub struct AccountObservation {
    pub address: Address,
    pub slots: ObservedSlots,
    pub intrinsics: IntrinsicsDiff,
}

/// Normalizes a [`RawAccountDiff`] into an [`AccountObservation`].
///
/// A slot with no `pre` value is treated as having read zero, matching EVM
/// semantics for storage that was never written before this transaction.
pub fn adapt(raw: RawAccountDiff) -> AccountObservation {
    let mut slots = ObservedSlots::new();
    for (slot, diff) in raw.storage {
        let current = diff.pre.unwrap_or(B256::ZERO);
        let next = (diff.post != current).then_some(diff.post);
        slots.insert(slot, ObservedSlot { current, next });
    }

    let intrinsics = IntrinsicsDiff {
        nonce: raw.nonce.filter(FieldDiff::changed),
        balance: raw.balance.filter(FieldDiff::changed),
        code_changed: raw.code.is_some_and(|c| c.changed()),
    };

    AccountObservation { address: raw.address, slots, intrinsics }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_missing_pre_value_to_zero() {
        let mut storage = BTreeMap::new();
        let slot = B256::repeat_byte(0x01);
        storage.insert(slot, RawSlotDiff { pre: None, post: B256::repeat_byte(0x02) });
        let raw = RawAccountDiff { address: Address::ZERO, storage, nonce: None, balance: None, code: None };

        let observation = adapt(raw);
        let observed = observation.slots.get(&slot).unwrap();
        assert_eq!(observed.current, B256::ZERO);
        assert_eq!(observed.next, Some(B256::repeat_byte(0x02)));
    }

    #[test]
    fn drops_unchanged_slots_and_intrinsics() {
        let mut storage = BTreeMap::new();
        let slot = B256::repeat_byte(0x03);
        storage.insert(slot, RawSlotDiff { pre: Some(B256::repeat_byte(0x09)), post: B256::repeat_byte(0x09) });
        let raw = RawAccountDiff {
            address: Address::ZERO,
            storage,
            nonce: Some(FieldDiff { before: 1, after: 1 }),
            balance: None,
            code: None,
        };

        let observation = adapt(raw);
        assert_eq!(observation.slots.get(&slot).unwrap().next, None);
        assert!(observation.intrinsics.nonce.is_none());
    }

    #[test]
    fn surfaces_intrinsic_changes() {
        let raw = RawAccountDiff {
            address: Address::ZERO,
            storage: BTreeMap::new(),
            nonce: Some(FieldDiff { before: 1, after: 2 }),
            balance: Some(FieldDiff { before: U256::ZERO, after: U256::from(5u64) }),
            code: Some(FieldDiff { before: vec![], after: vec![0xFE] }),
        };
        let observation = adapt(raw);
        assert_eq!(observation.intrinsics.nonce, Some(FieldDiff { before: 1, after: 2 }));
        assert_eq!(observation.intrinsics.balance, Some(FieldDiff { before: U256::ZERO, after: U256::from(5u64) }));
        assert!(observation.intrinsics.code_changed);
    }
}
