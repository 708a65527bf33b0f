/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Core resequencer engine.
//!
//! The engine holds out-of-order elements in a bounded, sorted buffer and
//! releases them to the out-queue strictly in sequence. Elements that wait
//! longer than the configured timeout behind a missing predecessor are
//! force-released, together with everything ordered before them, so no
//! element is held forever.

use super::comparator::SequenceElementComparator;
use super::element::SequenceElement;
use super::error::ResequencerError;
use super::release::{OutQueueSender, ReleaseKind, Released};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// What happens to buffered elements when the engine stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Release every pending element in sorted order, tagged
    /// [`ReleaseKind::Drained`].
    #[default]
    Drain,

    /// Hand pending elements back to the caller of
    /// [`ResequencerEngine::stop`] instead of releasing them.
    Discard,
}

/// Buffer position: sequence key first, arrival number to keep duplicates apart.
type Position<K> = (K, u64);

/// Mutable engine state. Only ever touched under the engine lock.
struct EngineState<T, K> {
    /// Held elements in comparator order.
    pending: BTreeMap<Position<K>, SequenceElement<T, K>>,

    /// Arrival index of held elements, oldest first.
    arrivals: BTreeMap<u64, (K, Instant)>,

    /// Key of the most recently released element.
    last_delivered: Option<K>,

    next_arrival: u64,
    next_release: u64,

    /// `None` once the engine has stopped, which closes the out-queue.
    out: Option<OutQueueSender<T, K>>,

    stopped: bool,
}

impl<T, K: Ord + Clone> EngineState<T, K> {
    /// Returns the largest buffer position among elements resident for at
    /// least `timeout`.
    fn expired_cutoff(&self, now: Instant, timeout: Duration) -> Option<Position<K>> {
        self.arrivals
            .iter()
            .take_while(|(_, (_, arrived_at))| now.saturating_duration_since(*arrived_at) >= timeout)
            .map(|(arrival_num, (key, _))| (key.clone(), *arrival_num))
            .max()
    }

    /// Instant at which the oldest held element times out, if representable.
    fn next_deadline(&self, timeout: Duration) -> Option<Instant> {
        self.arrivals
            .first_key_value()
            .and_then(|(_, (_, arrived_at))| arrived_at.checked_add(timeout))
    }
}

enum Insert<T> {
    Accepted,
    Full(T),
    Stopped,
}

enum Sweep {
    Stopped,
    Idle,
    Until(Instant),
}

struct EngineInner<T, C: SequenceElementComparator<T>> {
    comparator: C,
    capacity: usize,
    timeout: Option<Duration>,
    shutdown_policy: ShutdownPolicy,
    state: Mutex<EngineState<T, C::Key>>,

    /// Signalled whenever buffer space frees up or the engine stops.
    space: Notify,

    /// Signalled when the sweeper must recompute its deadline.
    wakeup: Arc<Notify>,

    sweeper: Mutex<Option<JoinHandle<()>>>,
}

/// Bounded reordering buffer with timeout-driven forced release.
///
/// The engine is a cheap, cloneable handle; all clones share one buffer. Any
/// number of producers may call [`put`](Self::put) concurrently. All buffer
/// mutations happen under a single lock, and released elements are pushed to
/// the out-queue under that same lock, so the out-queue order is the release
/// order.
///
/// Timeouts are evaluated on every `put`, and by a background sweeper once
/// [`start`](Self::start) has been called, so a silent producer cannot stall
/// stale elements.
///
/// # Examples
///
/// ```
/// use resequencer_rs::resequence::{NumericComparator, ResequencerEngine, out_queue};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (out, mut queue) = out_queue();
/// let engine = ResequencerEngine::<i64, _>::builder(NumericComparator::new())
///     .capacity(16)
///     .last_delivered(0)
///     .build(out)?;
///
/// engine.put(2).await?;
/// engine.put(1).await?;
///
/// assert_eq!(queue.recv().await.map(|r| r.key), Some(1));
/// assert_eq!(queue.recv().await.map(|r| r.key), Some(2));
/// # Ok(())
/// # }
/// ```
pub struct ResequencerEngine<T, C: SequenceElementComparator<T>> {
    inner: Arc<EngineInner<T, C>>,
}

impl<T, C: SequenceElementComparator<T>> Clone for ResequencerEngine<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Builder for [`ResequencerEngine`].
pub struct EngineBuilder<T, C: SequenceElementComparator<T>> {
    comparator: C,
    capacity: usize,
    timeout: Duration,
    shutdown_policy: ShutdownPolicy,
    last_delivered: Option<C::Key>,
    _payload: PhantomData<fn() -> T>,
}

impl<T, C: SequenceElementComparator<T>> EngineBuilder<T, C> {
    /// Maximum number of held elements before `put` waits.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Maximum residency of an element before it is force-released.
    /// `Duration::ZERO` disables forced release.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the [`ShutdownPolicy`].
    #[must_use]
    pub fn shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = policy;
        self
    }

    /// Seeds the release cursor, making the successor of `key` immediately
    /// releasable.
    #[must_use]
    pub fn last_delivered(mut self, key: C::Key) -> Self {
        self.last_delivered = Some(key);
        self
    }

    /// Builds the engine, releasing into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`ResequencerError::InvalidCapacity`] if the capacity is zero.
    pub fn build(self, out: OutQueueSender<T, C::Key>) -> Result<ResequencerEngine<T, C>, ResequencerError> {
        if self.capacity == 0 {
            return Err(ResequencerError::InvalidCapacity(self.capacity));
        }

        let state = EngineState {
            pending: BTreeMap::new(),
            arrivals: BTreeMap::new(),
            last_delivered: self.last_delivered,
            next_arrival: 1,
            next_release: 1,
            out: Some(out),
            stopped: false,
        };

        Ok(ResequencerEngine {
            inner: Arc::new(EngineInner {
                comparator: self.comparator,
                capacity: self.capacity,
                timeout: (!self.timeout.is_zero()).then_some(self.timeout),
                shutdown_policy: self.shutdown_policy,
                state: Mutex::new(state),
                space: Notify::new(),
                wakeup: Arc::new(Notify::new()),
                sweeper: Mutex::new(None),
            }),
        })
    }
}

impl<T, C> ResequencerEngine<T, C>
where
    T: Send + 'static,
    C: SequenceElementComparator<T>,
{
    /// Starts building an engine ordered by `comparator`.
    ///
    /// Defaults: capacity 1024, timeout disabled, [`ShutdownPolicy::Drain`].
    #[must_use]
    pub fn builder(comparator: C) -> EngineBuilder<T, C> {
        EngineBuilder {
            comparator,
            capacity: 1024,
            timeout: Duration::ZERO,
            shutdown_policy: ShutdownPolicy::default(),
            last_delivered: None,
            _payload: PhantomData,
        }
    }

    /// Creates an engine with the given capacity and no timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ResequencerError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(
        comparator: C,
        capacity: usize,
        out: OutQueueSender<T, C::Key>,
    ) -> Result<Self, ResequencerError> {
        Self::builder(comparator).capacity(capacity).build(out)
    }

    /// Spawns the background timeout sweeper onto `executor`.
    ///
    /// Does nothing if the timeout is disabled, the sweeper is already
    /// running or the engine has been stopped.
    pub fn start(&self, executor: &Handle) {
        let Some(timeout) = self.inner.timeout else {
            debug!("timeout disabled, sweeper not started");
            return;
        };

        let mut sweeper = self.inner.sweeper.lock();
        if sweeper.is_some() || self.is_stopped() {
            return;
        }

        let inner = Arc::downgrade(&self.inner);
        let wakeup = Arc::clone(&self.inner.wakeup);
        *sweeper = Some(executor.spawn(EngineInner::run_sweeper(inner, wakeup, timeout)));
        debug!(timeout_ms = millis(timeout), "timeout sweeper started");
    }

    /// Inserts an element into the reordering buffer.
    ///
    /// Waits while the buffer is at capacity, unless the element can be
    /// released on arrival (the next key in sequence, the first key, or a
    /// late key), in which case it passes straight through. Returns once the
    /// element has been accepted, which does not imply it has been released. Any
    /// elements that became releasable are pushed to the out-queue before
    /// this returns.
    ///
    /// # Errors
    ///
    /// - [`ResequencerError::MalformedElement`] if the comparator cannot
    ///   extract a key; the buffer is left untouched.
    /// - [`ResequencerError::Stopped`] if the engine is stopped before the
    ///   element could be accepted, including while waiting for space.
    pub async fn put(&self, element: T) -> Result<(), ResequencerError> {
        let key = self.inner.comparator.sequence_key(&element)?;
        let mut element = element;

        loop {
            let space = self.inner.space.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            match self.inner.insert(key.clone(), element) {
                Insert::Accepted => return Ok(()),
                Insert::Stopped => {
                    warn!(key = ?key, "element rejected, engine stopped");
                    return Err(ResequencerError::Stopped);
                }
                Insert::Full(returned) => element = returned,
            }

            debug!(key = ?key, capacity = self.inner.capacity, "buffer full, waiting for space");
            space.await;
        }
    }

    /// Runs one release pass at the current instant, forcing out timed-out
    /// elements. Returns the number of released elements.
    pub fn check_timeouts(&self) -> usize {
        let released = {
            let mut state = self.inner.state.lock();
            if state.stopped {
                return 0;
            }
            self.inner.release_ready(&mut state, Instant::now())
        };
        if released > 0 {
            self.inner.space.notify_waiters();
        }
        released
    }

    /// Stops the engine.
    ///
    /// Further `put` calls fail, producers waiting for space are woken with
    /// [`ResequencerError::Stopped`], the sweeper is cancelled and the
    /// out-queue is closed so the reader terminates once it has drained it.
    /// Pending elements are handled per the [`ShutdownPolicy`]: drained into
    /// the out-queue, or returned from this call. Stopping twice is a no-op.
    /// Dropping the last handle has the same effect, discarded payloads
    /// included.
    pub fn stop(&self) -> Vec<T> {
        let Some(discarded) = self.inner.close() else {
            return Vec::new();
        };

        if let Some(sweeper) = self.inner.sweeper.lock().take() {
            sweeper.abort();
        }
        self.inner.space.notify_waiters();
        self.inner.wakeup.notify_one();
        discarded
    }

    /// Key of the most recently released element.
    #[must_use]
    pub fn last_delivered(&self) -> Option<C::Key> {
        self.inner.state.lock().last_delivered.clone()
    }

    /// Moves the release cursor to `key` and releases whatever became ready.
    pub fn set_last_delivered(&self, key: C::Key) {
        let released = {
            let mut state = self.inner.state.lock();
            state.last_delivered = Some(key);
            if state.stopped {
                return;
            }
            self.inner.release_ready(&mut state, Instant::now())
        };
        if released > 0 {
            self.inner.space.notify_waiters();
        }
    }

    /// Number of elements currently held.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Maximum number of held elements.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Forced-release timeout, `None` if disabled.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    /// The configured [`ShutdownPolicy`].
    #[inline]
    #[must_use]
    pub fn shutdown_policy(&self) -> ShutdownPolicy {
        self.inner.shutdown_policy
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.state.lock().stopped
    }

    /// The comparator ordering this engine.
    #[must_use]
    pub fn comparator(&self) -> &C {
        &self.inner.comparator
    }
}

impl<T, C: SequenceElementComparator<T>> EngineInner<T, C> {
    fn insert(&self, key: C::Key, payload: T) -> Insert<T> {
        let (released, was_empty) = {
            let mut state = self.state.lock();
            if state.stopped {
                return Insert::Stopped;
            }

            let now = Instant::now();
            let arrival_num = state.next_arrival;
            let element = SequenceElement::new(key.clone(), arrival_num, now, payload);

            let mut released = 0;
            if state.pending.len() >= self.capacity {
                released = self.release_ready(&mut state, now);
            }
            let was_empty = state.pending.is_empty();

            if state.pending.len() < self.capacity {
                state.arrivals.insert(arrival_num, (key.clone(), now));
                state.pending.insert((key, arrival_num), element);
            } else {
                // a full buffer still passes an element that is releasable on arrival
                let position = (key, arrival_num);
                let Some(kind) = self.classify(state.last_delivered.as_ref(), &position, &element, None) else {
                    return Insert::Full(element.payload);
                };
                self.release(&mut state, element, kind, now);
                released += 1;
            }
            state.next_arrival += 1;

            released += self.release_ready(&mut state, now);
            (released, was_empty)
        };

        if released > 0 {
            self.space.notify_waiters();
        }
        if was_empty {
            self.wakeup.notify_one();
        }
        Insert::Accepted
    }

    /// Releases every element at the head of the buffer that is ready,
    /// cascading through successors. Returns the number released.
    fn release_ready(&self, state: &mut EngineState<T, C::Key>, now: Instant) -> usize {
        let cutoff = self
            .timeout
            .and_then(|timeout| state.expired_cutoff(now, timeout));

        let mut released = 0;
        loop {
            let Some((position, head)) = state.pending.first_key_value() else {
                break;
            };
            let Some(kind) = self.classify(state.last_delivered.as_ref(), position, head, cutoff.as_ref())
            else {
                break;
            };
            let Some((_, element)) = state.pending.pop_first() else {
                break;
            };
            state.arrivals.remove(&element.arrival_num);
            self.release(state, element, kind, now);
            released += 1;
        }
        released
    }

    fn classify(
        &self,
        last_delivered: Option<&C::Key>,
        position: &Position<C::Key>,
        head: &SequenceElement<T, C::Key>,
        cutoff: Option<&Position<C::Key>>,
    ) -> Option<ReleaseKind> {
        match last_delivered {
            Some(last) if self.comparator.is_successor(last, &head.key) => Some(ReleaseKind::InSequence),
            Some(last) if head.key <= *last => Some(ReleaseKind::Late),
            None if self.comparator.is_first(&head.key) => Some(ReleaseKind::InSequence),
            _ if cutoff.is_some_and(|cutoff| position <= cutoff) => Some(ReleaseKind::TimedOut),
            _ => None,
        }
    }

    fn release(
        &self,
        state: &mut EngineState<T, C::Key>,
        element: SequenceElement<T, C::Key>,
        kind: ReleaseKind,
        now: Instant,
    ) {
        let release_num = state.next_release;
        state.next_release += 1;

        if state
            .last_delivered
            .as_ref()
            .is_none_or(|last| element.key > *last)
        {
            state.last_delivered = Some(element.key.clone());
        }

        let waited = element.residency(now);
        match kind {
            ReleaseKind::InSequence | ReleaseKind::Drained => {
                debug!(key = ?element.key, release_num, ?kind, "element released");
            }
            ReleaseKind::Late | ReleaseKind::TimedOut => {
                warn!(
                    key = ?element.key,
                    release_num,
                    ?kind,
                    waited_ms = millis(waited),
                    "element released out of sequence"
                );
            }
        }

        let record = Released::new(release_num, element.key, kind, waited, element.payload);
        match &state.out {
            Some(out) => {
                if let Err(rejected) = out.send(record) {
                    error!(key = ?rejected.0.key, "out-queue closed, released element dropped");
                }
            }
            None => error!(key = ?record.key, "out-queue missing, released element dropped"),
        }
    }

    fn sweep(&self, timeout: Duration) -> Sweep {
        let (released, next) = {
            let mut state = self.state.lock();
            if state.stopped {
                return Sweep::Stopped;
            }
            let released = self.release_ready(&mut state, Instant::now());
            (released, state.next_deadline(timeout))
        };

        if released > 0 {
            debug!(released, "sweeper forced release");
            self.space.notify_waiters();
        }
        match next {
            Some(deadline) => Sweep::Until(deadline),
            None => Sweep::Idle,
        }
    }

    /// Marks the engine stopped, applies the shutdown policy and closes the
    /// out-queue. Returns the discarded payloads, or `None` if the engine
    /// was already stopped.
    fn close(&self) -> Option<Vec<T>> {
        let policy = self.shutdown_policy;
        let mut state = self.state.lock();
        if state.stopped {
            return None;
        }
        state.stopped = true;

        let now = Instant::now();
        let pending = std::mem::take(&mut state.pending);
        state.arrivals.clear();
        let remaining = pending.len();

        let discarded = match policy {
            ShutdownPolicy::Drain => {
                for element in pending.into_values() {
                    self.release(&mut state, element, ReleaseKind::Drained, now);
                }
                Vec::new()
            }
            ShutdownPolicy::Discard => pending
                .into_values()
                .map(|element| {
                    warn!(key = ?element.key, "discarding pending element on shutdown");
                    element.payload
                })
                .collect(),
        };

        state.out = None;
        info!(remaining, policy = ?policy, "resequencer engine stopped");
        Some(discarded)
    }

    /// Sweeps until the engine stops or its last handle is dropped. Holds
    /// the engine only for the duration of a pass.
    async fn run_sweeper(inner: Weak<Self>, wakeup: Arc<Notify>, timeout: Duration) {
        loop {
            let notified = wakeup.notified();
            let Some(sweep) = inner.upgrade().map(|inner| inner.sweep(timeout)) else {
                break;
            };
            match sweep {
                Sweep::Stopped => break,
                Sweep::Idle => notified.await,
                Sweep::Until(deadline) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(deadline) => {}
                        _ = notified => {}
                    }
                }
            }
        }
        debug!("timeout sweeper stopped");
    }
}

impl<T, C: SequenceElementComparator<T>> Drop for EngineInner<T, C> {
    fn drop(&mut self) {
        if let Some(discarded) = self.close() {
            warn!(discarded = discarded.len(), "resequencer engine dropped without stop");
        }
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.abort();
        }
    }
}

/// Whole milliseconds of `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

