/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Delivery task draining the engine's out-queue.

use super::release::{OutQueue, Released};
use super::sender::SequenceSender;
use std::fmt::Debug;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

/// Delivery counters reported when a reader finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Elements handed to the sender successfully.
    pub delivered: u64,

    /// Elements the sender failed to deliver.
    pub failed: u64,

    /// Released elements still queued when the reader was stopped.
    pub abandoned: u64,
}

/// Drains released elements and hands them to a [`SequenceSender`].
///
/// Runs as a single task, so the order in which the sender is invoked is
/// exactly the dequeue order. A failed delivery is logged and the reader
/// moves on to the next element; there is no retry.
pub struct SequenceReader<T, K, S> {
    sender: S,
    queue: OutQueue<T, K>,
    batch_size: usize,
}

impl<T, K, S> SequenceReader<T, K, S>
where
    T: Send + 'static,
    K: Debug + Send + 'static,
    S: SequenceSender<T>,
{
    /// Creates a reader delivering from `queue` through `sender`.
    #[must_use]
    pub fn new(sender: S, queue: OutQueue<T, K>) -> Self {
        Self {
            sender,
            queue,
            batch_size: 1,
        }
    }

    /// Lets the reader hand up to `batch_size` already released elements to
    /// [`SequenceSender::send_sync_batch`] at once. Values below 1 are
    /// treated as 1.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Spawns the drain loop onto `executor`.
    #[must_use]
    pub fn start(self, executor: &Handle) -> ReaderHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = executor.spawn(self.run(stop_rx));
        ReaderHandle { stop_tx, handle }
    }

    async fn run(self, mut stop_rx: oneshot::Receiver<()>) -> ReaderStats {
        let Self {
            sender,
            mut queue,
            batch_size,
        } = self;
        let mut stats = ReaderStats::default();
        let mut batch = Vec::with_capacity(batch_size);

        debug!(batch_size, "sequence reader started");
        loop {
            let next = tokio::select! {
                biased;
                _ = &mut stop_rx => None,
                next = queue.recv() => next,
            };
            let Some(first) = next else {
                break;
            };

            batch.push(first);
            while batch.len() < batch_size {
                match queue.try_recv() {
                    Ok(released) => batch.push(released),
                    Err(_) => break,
                }
            }

            deliver(&sender, &mut batch, &mut stats).await;
        }

        queue.close();
        while let Ok(released) = queue.try_recv() {
            warn!(key = ?released.key, release_num = released.release_num, "reader stopped, released element abandoned");
            stats.abandoned += 1;
        }

        info!(
            delivered = stats.delivered,
            failed = stats.failed,
            abandoned = stats.abandoned,
            "sequence reader stopped"
        );
        stats
    }
}

async fn deliver<T, K, S>(sender: &S, batch: &mut Vec<Released<T, K>>, stats: &mut ReaderStats)
where
    T: Send + 'static,
    K: Debug,
    S: SequenceSender<T>,
{
    if batch.len() == 1 {
        let Some(released) = batch.pop() else {
            return;
        };
        let Released {
            release_num,
            key,
            kind,
            payload,
            ..
        } = released;

        match sender.send_sync(payload).await {
            Ok(()) => {
                stats.delivered += 1;
                debug!(key = ?key, release_num, "element delivered");
            }
            Err(e) => {
                stats.failed += 1;
                error!(key = ?key, release_num, ?kind, error = %e, "element delivery failed");
            }
        }
        return;
    }

    let total = batch.len() as u64;
    let first_release = batch.first().map(|released| released.release_num);
    let payloads: Vec<T> = batch.drain(..).map(Released::into_payload).collect();

    match sender.send_sync_batch(payloads).await {
        Ok(()) => {
            stats.delivered += total;
            debug!(total, first_release, "batch delivered");
        }
        Err(e) => {
            let failed = (e.failed_count() as u64).min(total);
            stats.failed += failed;
            stats.delivered += total - failed;
            error!(total, failed, first_release, error = %e, "batch delivery failed");
        }
    }
}

/// Handle to a running [`SequenceReader`].
///
/// Dropping the handle signals the reader to stop.
pub struct ReaderHandle {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<ReaderStats>,
}

impl ReaderHandle {
    /// Signals the reader to stop and waits for it.
    ///
    /// A delivery already in progress completes first. Elements still queued
    /// are logged and counted as abandoned.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the reader task panicked or was cancelled.
    pub async fn stop(self) -> Result<ReaderStats, JoinError> {
        let _ = self.stop_tx.send(());
        self.handle.await
    }

    /// Waits for the reader to deliver everything and exit, which happens
    /// once the out-queue has been closed by stopping the engine.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the reader task panicked or was cancelled.
    pub async fn join(self) -> Result<ReaderStats, JoinError> {
        let Self { stop_tx, handle } = self;
        let stats = handle.await;
        drop(stop_tx);
        stats
    }

    /// Returns `true` if the reader task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
