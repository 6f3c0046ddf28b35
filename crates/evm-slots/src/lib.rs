//! Labels an EVM transaction's storage diff with the Solidity variables that
//! own each touched slot.
//!
//! The pure labeling algorithm — slot arithmetic, the preimage pool, the
//! decoder, the explorer, the diff adapter, and the result container —
//! lives in [`evm_slots_core`] and is re-exported here. This crate adds the
//! provider traits ([`DiffProvider`], [`PreimageProvider`], [`LayoutProvider`])
//! a caller implements to supply real data, the two public entry points
//! ([`trace_state`] and [`watch_state`]), EIP-1967 proxy-slot resolution,
//! and the public error taxonomy.

pub mod config;
pub mod diff_adapter;
pub mod error;
pub mod providers;
pub mod proxy;
pub mod watch;

pub use config::{ExplorerOptions, TraceOptions};
pub use diff_adapter::Providers;
pub use error::{ProviderError, TraceError};
pub use providers::{DiffProvider, LayoutProvider, PreimageProvider, TraceTarget};
pub use watch::{watch_state, SubscriptionId, WatchHandle, WatchOptions, WatchSource};

pub use evm_slots_core::{
    adapt, explore, AccessRecord, AccountObservation, AddressState, BytesKind, DecodedValue,
    ExploreConfig, ExploreOutput, FieldDiff, IntrinsicsDiff, LabeledVariable, LayoutError,
    LayoutVariable, ObservedSlot, ObservedSlots, PathSegment, Preimage, PreimagePool,
    PreimagePoolBuilder, PreimageType, RawAccountDiff, RawSlotDiff, SlotValue, StorageLayout,
    StructField, TraceResult, TypeDef, TypeId, VariableKind,
};

/// Traces one transaction — simulated from `target` or replayed from a hash
/// — and returns the labeled per-account diff. See [`TraceTarget`] for the
/// three accepted parameter shapes and [`TraceOptions`] for the knobs
/// common to all of them.
pub async fn trace_state(
    target: TraceTarget,
    options: TraceOptions,
    providers: &Providers<'_>,
) -> Result<TraceResult, TraceError> {
    diff_adapter::run_trace(&target, &options, providers).await
}
