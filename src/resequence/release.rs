/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Release records handed from the engine to the out-queue.
//!
//! Once an element is wrapped in a [`Released`] record and placed on the
//! out-queue its position in the output stream is fixed.

use tokio::sync::mpsc;
use tokio::time::Duration;

/// Why an element left the reordering buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseKind {
    /// The element was the gap-free successor of the last released key, or
    /// opened the sequence.
    InSequence,

    /// The element's key was not ahead of the last released key. This only
    /// happens for duplicates or for stragglers whose slot was already
    /// passed by a forced release.
    Late,

    /// The element, or an element ordered after it, exceeded the timeout
    /// while blocked behind a missing predecessor.
    TimedOut,

    /// The element was flushed out of the buffer when the engine stopped.
    Drained,
}

impl ReleaseKind {
    /// Returns `true` if the release skipped over a gap.
    #[inline]
    #[must_use]
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::TimedOut | Self::Drained)
    }
}

/// An element released by the engine.
///
/// # Examples
///
/// ```
/// use resequencer_rs::resequence::{ReleaseKind, Released};
/// use std::time::Duration;
///
/// let released = Released::new(1, 7_i64, ReleaseKind::InSequence, Duration::ZERO, "payload");
/// assert_eq!(released.release_num, 1);
/// assert!(!released.kind.is_forced());
/// ```
#[derive(Debug)]
pub struct Released<T, K> {
    /// Monotonically increasing release number, starting at 1.
    pub release_num: u64,

    /// Sequence key of the element.
    pub key: K,

    /// Why the element was released.
    pub kind: ReleaseKind,

    /// How long the element sat in the buffer.
    pub waited: Duration,

    /// The released payload.
    pub payload: T,
}

impl<T, K> Released<T, K> {
    /// Creates a new release record.
    #[must_use]
    pub fn new(release_num: u64, key: K, kind: ReleaseKind, waited: Duration, payload: T) -> Self {
        Self {
            release_num,
            key,
            kind,
            waited,
            payload,
        }
    }

    /// Consumes the record and returns the payload.
    #[inline]
    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }
}

/// Producer side of the hand-off queue between engine and reader.
pub type OutQueueSender<T, K> = mpsc::UnboundedSender<Released<T, K>>;

/// Consumer side of the hand-off queue between engine and reader.
pub type OutQueue<T, K> = mpsc::UnboundedReceiver<Released<T, K>>;

/// Creates the hand-off queue between an engine and its reader.
#[must_use]
pub fn out_queue<T, K>() -> (OutQueueSender<T, K>, OutQueue<T, K>) {
    mpsc::unbounded_channel()
}
