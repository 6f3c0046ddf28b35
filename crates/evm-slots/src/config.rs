//! Trace-wide configuration, layered over [`evm_slots_core::ExploreConfig`].

use std::collections::BTreeMap;

use alloy_primitives::Address;
use evm_slots_core::{ExploreConfig, StorageLayout};

/// Which external block-explorer APIs a [`crate::LayoutProvider`] or
/// [`crate::PreimageProvider`] implementation is permitted to consult. Purely
/// advisory — `evm-slots` never makes the HTTP calls itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplorerOptions {
    pub etherscan: bool,
    pub blockscout: bool,
}

/// Options common to every [`crate::trace_state`] call, independent of which
/// [`crate::TraceTarget`] shape was used.
#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// Layouts supplied directly by the caller, keyed by contract address.
    /// Consulted before falling back to the configured [`crate::LayoutProvider`].
    pub storage_layouts: BTreeMap<Address, StorageLayout>,
    pub explorers: ExplorerOptions,
    pub fetch_contracts: bool,
    pub fetch_storage_layouts: bool,
    pub config: ExploreConfig,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            storage_layouts: BTreeMap::new(),
            explorers: ExplorerOptions::default(),
            fetch_contracts: true,
            fetch_storage_layouts: true,
            config: ExploreConfig::default(),
        }
    }
}
