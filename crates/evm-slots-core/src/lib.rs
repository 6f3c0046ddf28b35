//! Pure, synchronous engine for labeling EVM storage slot diffs against a
//! Solidity storage layout.
//!
//! Everything in this crate is deterministic and I/O-free: given a
//! [`layout::StorageLayout`], an [`explorer::ObservedSlots`] map, and a
//! [`preimage::PreimagePool`], [`explorer::explore`] always produces the
//! same [`explorer::ExploreOutput`]. Fetching those inputs (RPC calls,
//! ABI-derived preimages, proxy detection) is the job of the `evm-slots`
//! crate one layer up.

pub mod decode;
pub mod diff;
pub mod error;
pub mod explorer;
pub mod layout;
pub mod path;
pub mod preimage;
pub mod result;
pub mod slot;

pub use diff::{adapt, AccountObservation, FieldDiff, IntrinsicsDiff, RawAccountDiff, RawSlotDiff};
pub use error::LayoutError;
pub use explorer::{explore, ExploreConfig, ExploreOutput, ObservedSlot, ObservedSlots};
pub use layout::{BytesKind, LayoutVariable, StorageLayout, StructField, TypeDef, TypeId};
pub use path::{AccessRecord, DecodedValue, LabeledVariable, PathSegment, SlotValue, VariableKind};
pub use preimage::{Preimage, PreimagePool, PreimagePoolBuilder, PreimageType};
pub use result::{AddressState, TraceResult};
