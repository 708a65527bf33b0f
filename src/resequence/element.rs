/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Sequence element held by the reordering buffer.

use tokio::time::{Duration, Instant};

/// An element waiting in the reordering buffer.
///
/// Wraps a payload together with its extracted sequence key and the instant
/// it entered the buffer. Elements are owned by the engine until they are
/// released to the out-queue.
#[derive(Debug)]
pub struct SequenceElement<T, K> {
    /// The extracted sequence key.
    pub key: K,

    /// Position in arrival order, unique per engine.
    pub arrival_num: u64,

    /// Instant the element was accepted into the buffer.
    pub arrived_at: Instant,

    /// The wrapped payload.
    pub payload: T,
}

impl<T, K> SequenceElement<T, K> {
    /// Creates a new element.
    #[must_use]
    pub fn new(key: K, arrival_num: u64, arrived_at: Instant, payload: T) -> Self {
        Self {
            key,
            arrival_num,
            arrived_at,
            payload,
        }
    }

    /// Time spent in the buffer as of `now`.
    #[inline]
    #[must_use]
    pub fn residency(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.arrived_at)
    }
}
