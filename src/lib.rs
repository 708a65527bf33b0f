/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! # resequencer-rs
//!
//! A resequencer for message exchange buses. Messages that arrive out of
//! order are held in a bounded buffer and forwarded in the order of an
//! application-level sequence number. A message whose predecessor never
//! arrives is forwarded once it has waited longer than a configurable
//! timeout, so a lost message delays the stream but never stalls it.
//!
//! ## Modules
//!
//! - [`resequence`]: the generic engine, its ordering strategy, and the
//!   delivery task that drains released elements
//! - [`exchange`]: the exchange, message and addressing model of the bus
//! - [`endpoint`]: the bus endpoint that resequences one-way exchanges
//!
//! ## Guarantees
//!
//! - The buffer never holds more than its capacity; producers wait for space
//! - Released keys are non-decreasing except where a timeout forced an
//!   element out ahead of a missing predecessor
//! - Delivery order equals release order
//!
//! ## Example
//!
//! ```
//! use resequencer_rs::resequence::{NumericComparator, ResequencerEngine, out_queue};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (out, mut queue) = out_queue();
//! let engine = ResequencerEngine::<i64, _>::builder(NumericComparator::new().with_first(1))
//!     .capacity(100)
//!     .build(out)?;
//!
//! for key in [4, 1, 3, 5, 2] {
//!     engine.put(key).await?;
//! }
//! engine.stop();
//!
//! let mut released = Vec::new();
//! while let Some(r) = queue.recv().await {
//!     released.push(r.into_payload());
//! }
//! assert_eq!(released, vec![1, 2, 3, 4, 5]);
//! # Ok(())
//! # }
//! ```

pub mod endpoint;
pub mod exchange;
pub mod resequence;

pub use endpoint::{ResequencerConfig, ResequencerEndpoint};
pub use resequence::{ResequencerEngine, SequenceElementComparator, SequenceReader, SequenceSender};
