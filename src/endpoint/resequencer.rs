/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! The resequencer endpoint.

use super::comparator::DefaultComparator;
use super::config::ResequencerConfig;
use super::error::EndpointError;
use super::sender::ExchangeSender;
use crate::exchange::{DeliveryChannel, ExchangeStatus, ExchangeTarget, MessageExchange};
use crate::resequence::{
    ReaderHandle, ReaderStats, ResequencerEngine, SequenceElementComparator, SequenceReader, out_queue,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Outcome of [`ResequencerEndpoint::shutdown`].
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Counters of the delivery task.
    pub reader: ReaderStats,

    /// Buffered exchanges handed back under
    /// [`ShutdownPolicy::Discard`](crate::resequence::ShutdownPolicy::Discard).
    pub discarded: Vec<MessageExchange>,
}

/// Consumer endpoint that resequences one-way exchanges.
///
/// Each accepted exchange is copied into a new exchange addressed to the
/// configured target and handed to the engine; the original is acknowledged
/// done as soon as the copy is buffered. The copies reach the target in
/// sequence-number order through a dedicated delivery task.
///
/// The endpoint owns its engine and delivery task. Both are started by
/// [`start`](Self::start) and torn down by [`shutdown`](Self::shutdown).
pub struct ResequencerEndpoint<Ch, C = DefaultComparator>
where
    Ch: DeliveryChannel,
    C: SequenceElementComparator<MessageExchange>,
{
    engine: ResequencerEngine<MessageExchange, C>,
    reader: Mutex<Option<ReaderHandle>>,
    channel: Arc<Ch>,
    target: ExchangeTarget,
}

impl<Ch: DeliveryChannel> ResequencerEndpoint<Ch> {
    /// Starts an endpoint ordering exchanges with the configured
    /// [`DefaultComparator`].
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Config`] if the configuration is invalid.
    pub fn start(config: ResequencerConfig, channel: Arc<Ch>, executor: &Handle) -> Result<Self, EndpointError> {
        let comparator = config.comparator.clone();
        Self::start_with_comparator(config, comparator, channel, executor)
    }
}

impl<Ch, C> ResequencerEndpoint<Ch, C>
where
    Ch: DeliveryChannel,
    C: SequenceElementComparator<MessageExchange>,
{
    /// Starts an endpoint ordering exchanges with `comparator`. The
    /// comparator settings of `config` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Config`] if the configuration is invalid.
    pub fn start_with_comparator(
        config: ResequencerConfig,
        comparator: C,
        channel: Arc<Ch>,
        executor: &Handle,
    ) -> Result<Self, EndpointError> {
        config.validate()?;

        let (out, queue) = out_queue();
        let engine = ResequencerEngine::builder(comparator)
            .capacity(config.capacity)
            .timeout(config.timeout())
            .shutdown_policy(config.shutdown)
            .build(out)?;
        engine.start(executor);

        let reader = SequenceReader::new(ExchangeSender::new(Arc::clone(&channel)), queue)
            .with_batch_size(config.reader_batch_size)
            .start(executor);

        info!(
            capacity = config.capacity,
            timeout_ms = config.timeout_ms,
            batch_size = config.reader_batch_size,
            "resequencer endpoint started"
        );

        Ok(Self {
            engine,
            reader: Mutex::new(Some(reader)),
            channel,
            target: config.target,
        })
    }

    /// Accepts an inbound exchange.
    ///
    /// Exchanges already completed are ignored and exchanges carrying a
    /// fault are acknowledged without being resequenced. Otherwise the in
    /// message is copied to a new exchange for the target and buffered,
    /// waiting while the buffer is full, and the original is acknowledged
    /// done.
    ///
    /// # Errors
    ///
    /// If the exchange cannot be accepted it is failed with the error and
    /// returned over the channel, and the error is returned:
    ///
    /// - [`EndpointError::UnsupportedPattern`] for request/response patterns
    /// - [`EndpointError::Resequencer`] for malformed sequence numbers or a
    ///   stopped endpoint
    /// - [`EndpointError::Messaging`] if the exchange has no in message or
    ///   the target cannot be addressed
    pub async fn process(&self, mut exchange: MessageExchange) -> Result<(), EndpointError> {
        if !exchange.pattern.is_one_way() {
            let err = EndpointError::UnsupportedPattern(exchange.pattern);
            return Err(self.fail(exchange, err).await);
        }

        match exchange.status {
            ExchangeStatus::Done | ExchangeStatus::Error => {
                debug!(exchange = %exchange.id, status = ?exchange.status, "ignoring completed exchange");
                return Ok(());
            }
            ExchangeStatus::Active => {}
        }

        if exchange.fault.is_some() {
            debug!(exchange = %exchange.id, "acknowledging faulted exchange");
            exchange.set_done();
            self.channel.send(exchange).await?;
            return Ok(());
        }

        if let Err(err) = self.resequence(&exchange).await {
            return Err(self.fail(exchange, err).await);
        }

        exchange.set_done();
        self.channel.send(exchange).await?;
        Ok(())
    }

    /// Rejects a request that expects a synchronous reply.
    ///
    /// # Errors
    ///
    /// Always fails the exchange and returns
    /// [`EndpointError::UnsupportedOperation`].
    pub async fn process_sync(&self, exchange: MessageExchange) -> Result<(), EndpointError> {
        let err = EndpointError::UnsupportedOperation("synchronous resequencing not supported");
        Err(self.fail(exchange, err).await)
    }

    /// Stops the engine and then waits for the delivery task to finish.
    ///
    /// Buffered exchanges are drained to the target or handed back,
    /// depending on the configured shutdown policy. Producers blocked in
    /// [`process`](Self::process) fail with a stopped error. Calling this
    /// more than once returns an empty report.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::Reader`] if the delivery task panicked.
    pub async fn shutdown(&self) -> Result<ShutdownReport, EndpointError> {
        let discarded = self.engine.stop();
        let reader = self.reader.lock().take();
        let Some(reader) = reader else {
            return Ok(ShutdownReport {
                reader: ReaderStats::default(),
                discarded,
            });
        };

        let stats = reader.join().await?;
        info!(
            delivered = stats.delivered,
            failed = stats.failed,
            discarded = discarded.len(),
            "resequencer endpoint stopped"
        );
        Ok(ShutdownReport {
            reader: stats,
            discarded,
        })
    }

    /// The engine buffering exchanges for this endpoint.
    #[must_use]
    pub fn engine(&self) -> &ResequencerEngine<MessageExchange, C> {
        &self.engine
    }

    /// Where resequenced exchanges are sent.
    #[must_use]
    pub fn target(&self) -> &ExchangeTarget {
        &self.target
    }

    async fn resequence(&self, source: &MessageExchange) -> Result<(), EndpointError> {
        let message = source.require_in_message()?.clone();
        let mut target = MessageExchange::new(source.pattern).with_in_message(message);
        self.target.configure_target(&mut target)?;
        debug!(source = %source.id, target = %target.id, "buffering exchange copy");
        self.engine.put(target).await?;
        Ok(())
    }

    async fn fail(&self, mut exchange: MessageExchange, err: EndpointError) -> EndpointError {
        warn!(exchange = %exchange.id, error = %err, "failing exchange");
        exchange.set_error(&err);
        if let Err(e) = self.channel.send(exchange).await {
            warn!(error = %e, "cannot return failed exchange");
        }
        err
    }
}
