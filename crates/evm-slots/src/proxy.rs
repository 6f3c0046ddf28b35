//! Glue between a [`crate::LayoutProvider`]'s proxy detection and the pure
//! [`evm_slots_core::StorageLayout::augment_with_proxy_slots`] helper.

use alloy_primitives::Address;
use evm_slots_core::StorageLayout;

use crate::error::TraceError;
use crate::providers::LayoutProvider;

/// Fetches `address`'s layout and, if the provider says it's a proxy, merges
/// in the EIP-1967 `__implementation`/`__admin` pseudo-variables.
pub async fn resolve_layout(
    provider: &dyn LayoutProvider,
    address: Address,
) -> Result<Option<StorageLayout>, TraceError> {
    let layout = provider
        .fetch_layout(address)
        .await
        .map_err(|source| TraceError::LayoutProviderFailure { address, source })?;

    let Some(layout) = layout else { return Ok(None) };

    let is_proxy = provider
        .is_proxy(address)
        .await
        .map_err(|source| TraceError::LayoutProviderFailure { address, source })?;

    Ok(Some(if is_proxy { layout.augment_with_proxy_slots() } else { layout }))
}
