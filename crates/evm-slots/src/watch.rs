//! Subscribes to new blocks and re-runs a trace for every transaction that
//! touches a watched address, in the spirit of `anvil::pubsub`'s
//! per-subscription event loop and `anvil::filter::Filters`' cooperative
//! eviction checks.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use evm_slots_core::{AddressState, StorageLayout};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::TraceOptions;
use crate::diff_adapter::{run_trace, Providers};
use crate::error::TraceError;
use crate::providers::TraceTarget;

/// Identifies one `watch_state` subscription, the way
/// `anvil_core::eth::subscription::SubscriptionId` identifies one pubsub
/// stream. Opaque and random; carries no meaning beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(B256);

impl SubscriptionId {
    fn new() -> Self {
        Self(B256::random())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", alloy_primitives::hex::encode(self.0.as_slice()))
    }
}

/// A source of new, already-mined transactions that touch the watched
/// address. Left abstract: a JSON-RPC `eth_subscribe("newHeads")` poller, a
/// local node's event bus, and a test fixture all implement this the same
/// way. Returns `None` once the underlying source is exhausted or closed.
#[async_trait]
pub trait WatchSource: Send {
    async fn next_transaction(&mut self) -> Option<TraceTarget>;
}

pub struct WatchOptions {
    pub address: Address,
    pub storage_layout: Option<StorageLayout>,
    pub config: evm_slots_core::ExploreConfig,
    pub on_state_change: Box<dyn Fn(AddressState) + Send + 'static>,
    pub on_error: Option<Box<dyn Fn(TraceError) + Send + 'static>>,
}

/// Returned by [`watch_state`]. Dropping this without calling
/// [`WatchHandle::unsubscribe`] leaves the loop running in the background —
/// call `unsubscribe` to stop it deterministically.
pub struct WatchHandle {
    id: SubscriptionId,
    cancel: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Signals the loop to stop polling. It finishes whatever trace is
    /// in flight and releases resources at its next quiescent point —
    /// never torn down mid-trace.
    pub async fn unsubscribe(self) {
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.task.await;
    }
}

/// Starts watching `options.address`, invoking `options.on_state_change`
/// once per `(tx, watched_address)` with that address's labeled state.
/// Callback invocations are sequential per subscription — the loop never
/// runs two at once.
pub fn watch_state(
    mut source: Box<dyn WatchSource>,
    diff: Arc<dyn crate::providers::DiffProvider>,
    preimages: Arc<dyn crate::providers::PreimageProvider>,
    layouts: Arc<dyn crate::providers::LayoutProvider>,
    options: WatchOptions,
) -> WatchHandle {
    let id = SubscriptionId::new();
    let cancel = Arc::new(AtomicBool::new(false));
    let loop_cancel = cancel.clone();

    let watched = options.address;
    let mut storage_layouts = std::collections::BTreeMap::new();
    if let Some(layout) = options.storage_layout {
        storage_layouts.insert(watched, layout);
    }
    let trace_options = TraceOptions { storage_layouts, config: options.config, ..TraceOptions::default() };
    let on_state_change = options.on_state_change;
    let on_error = options.on_error;

    let task = tokio::spawn(async move {
        loop {
            if loop_cancel.load(Ordering::Relaxed) {
                debug!(target: "evm_slots::watch", %id, "subscription cancelled");
                break;
            }

            let Some(target) = source.next_transaction().await else {
                debug!(target: "evm_slots::watch", %id, "source exhausted");
                break;
            };

            let providers = Providers { diff: &*diff, preimages: &*preimages, layouts: &*layouts };
            match run_trace(&target, &trace_options, &providers).await {
                Ok(result) => {
                    if let Some(state) = result.get(watched) {
                        on_state_change(state.clone());
                    }
                }
                Err(err) => {
                    warn!(target: "evm_slots::watch", %id, error = %err, "trace failed");
                    if let Some(on_error) = &on_error {
                        on_error(err);
                    }
                }
            }
        }
    });

    WatchHandle { id, cancel, task }
}
