//! The final shape handed back to a caller: one entry per touched account,
//! each carrying its labeled variables and whatever couldn't be labeled.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::diff::IntrinsicsDiff;
use crate::explorer::ExploreOutput;
use crate::path::LabeledVariable;

/// Everything observed and labeled for one account in one transaction.
///
/// `address` is always lowercase hex (`0x` + 40 lowercase hex chars), never
/// checksummed — callers that need EIP-55 casing re-derive it from
/// [`AddressState::address_bytes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressState {
    pub address: String,
    pub intrinsics: IntrinsicsDiff,
    pub variables: Vec<LabeledVariable>,
    pub unexplored: Vec<LabeledVariable>,
}

impl AddressState {
    pub fn new(address: Address, intrinsics: IntrinsicsDiff, output: ExploreOutput) -> Self {
        Self {
            address: normalize_address(address),
            intrinsics,
            variables: output.variables,
            unexplored: output.unexplored,
        }
    }

    pub fn address_bytes(&self) -> Option<Address> {
        self.address.parse().ok()
    }

    /// True when nothing was labeled and nothing was left unexplored —
    /// every observed slot had a variable whose trace was non-empty but
    /// intrinsics also didn't change. Mostly useful to filter a
    /// [`TraceResult`] down to accounts worth showing a user.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
            && self.unexplored.is_empty()
            && self.intrinsics.nonce.is_none()
            && self.intrinsics.balance.is_none()
            && !self.intrinsics.code_changed
    }
}

/// The complete result of labeling one transaction's storage diff, across
/// every account it touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceResult {
    pub accounts: Vec<AddressState>,
}

impl TraceResult {
    pub fn push(&mut self, state: AddressState) {
        self.accounts.push(state);
    }

    pub fn get(&self, address: Address) -> Option<&AddressState> {
        let needle = normalize_address(address);
        self.accounts.iter().find(|a| a.address == needle)
    }
}

fn normalize_address(address: Address) -> String {
    format!("0x{}", alloy_primitives::hex::encode(address.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::ExploreOutput;

    #[test]
    fn normalizes_address_to_lowercase_hex() {
        let addr = Address::repeat_byte(0xAB);
        let state = AddressState::new(addr, IntrinsicsDiff::default(), ExploreOutput::default());
        assert_eq!(state.address, format!("0x{}", "ab".repeat(20)));
        assert_eq!(state.address_bytes(), Some(addr));
    }

    #[test]
    fn lookup_by_address_is_case_insensitive_to_storage_form() {
        let addr = Address::repeat_byte(0x01);
        let mut result = TraceResult::default();
        result.push(AddressState::new(addr, IntrinsicsDiff::default(), ExploreOutput::default()));
        assert!(result.get(addr).is_some());
        assert!(result.get(Address::repeat_byte(0x02)).is_none());
    }
}
