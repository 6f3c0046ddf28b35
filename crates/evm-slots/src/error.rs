//! The only errors that ever surface to a caller of [`crate::trace_state`] or
//! [`crate::watch_state`]. Everything else (missing layout, decode failure,
//! budget exhaustion) degrades into the trace result instead of an `Err` —
//! see [`evm_slots_core::explorer`].

use alloy_primitives::Address;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("invalid trace parameters: {0}")]
    InvalidParams(String),

    #[error("diff provider failed: {0}")]
    DiffProviderFailure(#[source] ProviderError),

    #[error("layout provider failed for {address}: {source}")]
    LayoutProviderFailure { address: Address, #[source] source: ProviderError },

    #[error("preimage provider failed: {0}")]
    PreimageProviderFailure(#[source] ProviderError),
}

/// Opaque transport-level failure from a provider implementation. `evm-slots`
/// does not know or care whether the underlying transport was JSON-RPC,
/// a local EVM, or a test double — it only needs a `Display`-able cause.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ProviderError(#[from] pub Box<dyn std::error::Error + Send + Sync>);

impl ProviderError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        #[derive(Debug, thiserror::Error)]
        #[error("{0}")]
        struct Message(String);
        Self(Box::new(Message(message.into())))
    }
}
