/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Resequencer engine for restoring the order of message streams.
//!
//! This module provides a bounded reordering buffer that accepts elements in
//! any order and releases them in the order of an extracted sequence key,
//! plus the delivery task that hands released elements downstream.
//!
//! # Architecture
//!
//! - Producers call [`ResequencerEngine::put`], which waits while the buffer
//!   is at capacity
//! - A [`SequenceElementComparator`] extracts the key and decides adjacency
//! - Ready elements move from the buffer to an unbounded out-queue under the
//!   engine lock, so release order is fixed at that point
//! - Elements stuck behind a missing predecessor longer than the timeout are
//!   force-released by `put` or by the background sweeper
//! - A single [`SequenceReader`] task drains the out-queue into a
//!   [`SequenceSender`]
//!
//! # Examples
//!
//! ```no_run
//! use resequencer_rs::resequence::{
//!     NumericComparator, ResequencerEngine, SendError, SequenceReader, SequenceSender, out_queue,
//! };
//! use std::time::Duration;
//!
//! struct Printer;
//!
//! impl SequenceSender<i64> for Printer {
//!     async fn send_sync(&self, element: i64) -> Result<(), SendError> {
//!         println!("{element}");
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = tokio::runtime::Handle::current();
//! let (out, queue) = out_queue();
//!
//! let engine = ResequencerEngine::<i64, _>::builder(NumericComparator::new().with_first(1))
//!     .capacity(100)
//!     .timeout(Duration::from_millis(500))
//!     .build(out)?;
//! engine.start(&executor);
//!
//! let reader = SequenceReader::new(Printer, queue).start(&executor);
//!
//! for key in [4, 1, 3, 5, 2] {
//!     engine.put(key).await?;
//! }
//!
//! engine.stop();
//! let stats = reader.join().await?;
//! assert_eq!(stats.delivered, 5);
//! # Ok(())
//! # }
//! ```

pub mod comparator;
pub mod element;
pub mod engine;
pub mod error;
pub mod reader;
pub mod release;
pub mod sender;

#[cfg(test)]
mod tests;

// Re-export main types
pub use comparator::{NumericComparator, SequenceElementComparator};
pub use element::SequenceElement;
pub use engine::{EngineBuilder, ResequencerEngine, ShutdownPolicy};
pub use error::{ResequencerError, SendError};
pub use reader::{ReaderHandle, ReaderStats, SequenceReader};
pub use release::{OutQueue, OutQueueSender, ReleaseKind, Released, out_queue};
pub use sender::SequenceSender;
