/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Final delivery of released elements.

use super::error::SendError;
use std::future::Future;
use tracing::warn;

/// Delivers ready, in-order elements downstream.
///
/// The [`SequenceReader`](super::SequenceReader) awaits each call before
/// dequeuing the next element, so implementations observe elements in
/// release order. What "sending" means is up to the implementation.
pub trait SequenceSender<T: Send + 'static>: Send + Sync + 'static {
    /// Delivers a single element, completing once delivery has finished.
    fn send_sync(&self, element: T) -> impl Future<Output = Result<(), SendError>> + Send;

    /// Delivers `elements` one at a time in list order.
    ///
    /// The default implementation keeps going past failed members and
    /// reports them together as [`SendError::Batch`].
    fn send_sync_batch(&self, elements: Vec<T>) -> impl Future<Output = Result<(), SendError>> + Send {
        async move {
            let total = elements.len();
            let mut failed = 0;
            let mut first = None;

            for element in elements {
                if let Err(e) = self.send_sync(element).await {
                    warn!(error = %e, "batch member delivery failed");
                    failed += 1;
                    first.get_or_insert_with(|| e.to_string());
                }
            }

            match first {
                None => Ok(()),
                Some(first) => Err(SendError::Batch {
                    failed,
                    total,
                    first,
                }),
            }
        }
    }
}
