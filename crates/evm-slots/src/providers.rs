//! The three oracle traits `trace_state`/`watch_state` are generic over.
//! None of them prescribe a transport: a JSON-RPC client, a local `revm`
//! instance, or a fixture-backed test double all implement the same shape.

use std::collections::BTreeMap;

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use evm_slots_core::{PreimagePool, RawAccountDiff, StorageLayout};

use crate::error::ProviderError;

/// Exactly one of the three shapes `trace_state` accepts, matching spec
/// §6.1's "exactly one shape; other fields forbidden".
#[derive(Debug, Clone)]
pub enum TraceTarget {
    /// Simulate a raw call.
    Data { from: Address, to: Option<Address>, data: Option<Vec<u8>>, value: Option<U256> },
    /// Simulate an ABI-encoded call.
    Abi { from: Address, to: Address, abi: JsonAbi, function_name: String, args: Vec<String>, value: Option<U256> },
    /// Replay a transaction that already landed on-chain.
    Replay { tx_hash: TxHash },
}

/// Fetches the pre/post account diff for one [`TraceTarget`].
#[async_trait]
pub trait DiffProvider: Send + Sync {
    async fn fetch_diff(&self, target: &TraceTarget) -> Result<BTreeMap<Address, RawAccountDiff>, ProviderError>;
}

/// Fetches candidate mapping-key / array-index preimages for one
/// [`TraceTarget`] — decoded ABI arguments, call data, and stack values, in
/// the priority order spec §4.2 describes. Touched addresses are added by
/// `trace_state` itself, not by this provider.
#[async_trait]
pub trait PreimageProvider: Send + Sync {
    async fn fetch_preimages(&self, target: &TraceTarget) -> Result<PreimagePool, ProviderError>;
}

/// Fetches the storage layout for one contract address, or `None` when the
/// contract is unverified / has no known layout — the caller still gets a
/// trace, just with unlabeled `slot_<hex>` records for that address.
#[async_trait]
pub trait LayoutProvider: Send + Sync {
    async fn fetch_layout(&self, address: Address) -> Result<Option<StorageLayout>, ProviderError>;

    /// Whether `address` should have EIP-1967 proxy slots merged into
    /// whatever layout is returned. Default: never: detecting proxy-ness
    /// from bytecode is out of scope for this crate (spec §9).
    async fn is_proxy(&self, _address: Address) -> Result<bool, ProviderError> {
        Ok(false)
    }
}
