//! The only errors this crate can raise: malformed layout input.
//!
//! The Explorer itself never returns an error — see [`crate::explorer`] — it
//! degrades per-slot instead (unlabeled slots, absent `decoded`, budget
//! exhaustion). This enum only covers failures that happen before
//! exploration can begin at all.

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("failed to parse storage layout JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("slot `{0}` is not a valid base-10 256-bit integer")]
    InvalidSlot(String),
    #[error("type `{0}` referenced but missing a required field")]
    UnknownType(String),
    #[error("static array type `{0}` label did not encode a length, e.g. `uint256[3]`")]
    MissingArrayLength(String),
    #[error("unknown storage encoding `{0}`")]
    UnknownEncoding(String),
}
