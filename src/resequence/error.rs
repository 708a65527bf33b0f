/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Error types for the resequencer engine and its delivery side.

use thiserror::Error;

/// Errors returned by [`ResequencerEngine`](super::ResequencerEngine) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResequencerError {
    /// The engine was configured with a capacity of zero.
    #[error("invalid capacity {0}: the reordering buffer must hold at least one element")]
    InvalidCapacity(usize),

    /// The comparator could not extract a sequence key from an element.
    #[error("malformed element: {0}")]
    MalformedElement(String),

    /// The engine has been stopped and no longer accepts elements.
    #[error("resequencer engine has been stopped")]
    Stopped,
}

/// Errors reported by a [`SequenceSender`](super::SequenceSender).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The downstream destination rejected the element.
    #[error("delivery rejected: {0}")]
    Rejected(String),

    /// The downstream destination answered with a fault.
    #[error("delivery faulted: {0}")]
    Fault(String),

    /// The transport to the destination is unavailable.
    #[error("transport unavailable: {0}")]
    Transport(String),

    /// Some members of a batch could not be delivered.
    #[error("{failed} of {total} batch members failed, first failure: {first}")]
    Batch {
        /// Number of failed members.
        failed: usize,
        /// Size of the batch.
        total: usize,
        /// Message of the first failure.
        first: String,
    },
}

impl SendError {
    /// Number of elements this error accounts for.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        match self {
            Self::Batch { failed, .. } => *failed,
            _ => 1,
        }
    }
}
