//! Orchestration: calls the three provider traits, feeds their output
//! through [`evm_slots_core`]'s pure Diff Adapter and Explorer, and returns
//! the address-keyed [`TraceResult`]. This is the only place in the crate
//! that knows how a trace actually gets assembled end to end; both
//! [`crate::trace_state`] and the watch loop call it.

use alloy_primitives::Address;
use evm_slots_core::{adapt, explore, AddressState, PreimagePool, StorageLayout, TraceResult};
use tracing::info;

use crate::config::TraceOptions;
use crate::error::TraceError;
use crate::providers::{DiffProvider, LayoutProvider, PreimageProvider, TraceTarget};
use crate::proxy::resolve_layout;

/// Bundles the three oracle traits a trace needs, so call sites don't have
/// to pass three separate references through every function.
pub struct Providers<'a> {
    pub diff: &'a dyn DiffProvider,
    pub preimages: &'a dyn PreimageProvider,
    pub layouts: &'a dyn LayoutProvider,
}

/// Runs one full trace: fetch diff + preimages, resolve a layout per
/// touched address, label every slot, and assemble the result.
pub async fn run_trace(
    target: &TraceTarget,
    options: &TraceOptions,
    providers: &Providers<'_>,
) -> Result<TraceResult, TraceError> {
    validate(target)?;

    info!(target: "evm_slots::trace", "trace start");

    let raw_diffs = providers
        .diff
        .fetch_diff(target)
        .await
        .map_err(TraceError::DiffProviderFailure)?;

    let fetched_pool = providers
        .preimages
        .fetch_preimages(target)
        .await
        .map_err(TraceError::PreimageProviderFailure)?;
    let pool = merge_touched_addresses(fetched_pool, raw_diffs.keys().copied());

    info!(target: "evm_slots::trace", accounts = raw_diffs.len(), preimages = pool.len(), "fetched diff and preimages");

    let mut result = TraceResult::default();
    for (address, raw_diff) in raw_diffs {
        let layout = resolve_address_layout(address, options, providers).await?;
        let observation = adapt(raw_diff);
        let observed_slot_count = observation.slots.len();
        let output = explore(&layout.unwrap_or_default(), &observation.slots, &pool, &options.config);

        info!(
            target: "evm_slots::trace",
            %address,
            observed_slots = observed_slot_count,
            unexplored_slots = output.unexplored.len(),
            "labeled account"
        );

        result.push(AddressState::new(address, observation.intrinsics, output));
    }

    info!(target: "evm_slots::trace", accounts = result.accounts.len(), "trace end");
    Ok(result)
}

async fn resolve_address_layout(
    address: Address,
    options: &TraceOptions,
    providers: &Providers<'_>,
) -> Result<Option<StorageLayout>, TraceError> {
    if let Some(layout) = options.storage_layouts.get(&address) {
        return Ok(Some(layout.clone()));
    }
    if !options.fetch_storage_layouts {
        return Ok(None);
    }
    resolve_layout(providers.layouts, address).await
}

fn merge_touched_addresses(pool: PreimagePool, addresses: impl Iterator<Item = Address>) -> PreimagePool {
    let mut builder = PreimagePool::builder();
    for item in pool.iter() {
        builder = builder.push(item.hex, item.decoded.clone(), item.ty);
    }
    for address in addresses {
        builder = builder.push_address(address);
    }
    builder.build()
}

fn validate(target: &TraceTarget) -> Result<(), TraceError> {
    match target {
        TraceTarget::Abi { function_name, .. } if function_name.trim().is_empty() => {
            Err(TraceError::InvalidParams("function_name must not be empty".to_string()))
        }
        _ => Ok(()),
    }
}
