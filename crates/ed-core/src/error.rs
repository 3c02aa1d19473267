//! Error taxonomy for the synchronization store.
//!
//! Protocol misuse and unknown-id references are fatal to the triggering
//! call and leave the store untouched. Data-integrity conditions
//! (unrepresentable kinds during assembly, duplicate ids observed outside
//! an explicit dedupe) are recovered locally and logged, never raised.

use thiserror::Error;

use crate::block::BlockId;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A required construction option was missing or empty. Host bug.
    #[error("missing required option: {0}")]
    MissingOption(&'static str),

    /// The text engine handle was bound a second time. Host bug.
    #[error("text engine already initialized")]
    EngineAlreadyBound,

    /// An event referenced an id absent from the block list.
    #[error("unknown block id: {0}")]
    BlockNotFound(BlockId),

    /// A placeholder-only operation targeted a non-placeholder block.
    #[error("block {0} is not a placeholder")]
    NotAPlaceholder(BlockId),

    /// A metadata deep-set path was empty or crossed a non-object value.
    #[error("invalid metadata path for block {0}")]
    InvalidMetadataPath(BlockId),
}
