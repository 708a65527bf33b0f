use crate::init_tracing;
use resequencer_rs::endpoint::{DefaultComparator, ResequencerConfig, ResequencerEndpoint};
use resequencer_rs::exchange::{
    DeliveryChannel, ExchangeStatus, ExchangeTarget, MessageExchange, MessagingError,
    NormalizedMessage, QName,
};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Forwards delivered exchanges to a receiver and collects acknowledgements.
struct Bus {
    receiver: mpsc::UnboundedSender<MessageExchange>,
    acks: Mutex<Vec<MessageExchange>>,
}

impl DeliveryChannel for Bus {
    async fn send_sync(&self, mut exchange: MessageExchange) -> Result<MessageExchange, MessagingError> {
        self.receiver
            .send(exchange.clone())
            .map_err(|_| MessagingError::ChannelClosed)?;
        exchange.set_done();
        Ok(exchange)
    }

    async fn send(&self, exchange: MessageExchange) -> Result<(), MessagingError> {
        self.acks.lock().unwrap().push(exchange);
        Ok(())
    }
}

fn numbered(n: i64) -> MessageExchange {
    MessageExchange::in_only(
        NormalizedMessage::new()
            .with_property("seqnum", n)
            .with_content(format!("<number>{n}</number>")),
    )
    .with_service(QName::local("resequencer"))
}

fn bus() -> (Arc<Bus>, mpsc::UnboundedReceiver<MessageExchange>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let bus = Arc::new(Bus {
        receiver: tx,
        acks: Mutex::new(Vec::new()),
    });
    (bus, rx)
}

fn seqnum(exchange: &MessageExchange) -> i64 {
    exchange
        .in_message
        .as_ref()
        .and_then(|m| m.property("seqnum"))
        .and_then(|v| v.as_i64())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_scrambled_stream_arrives_in_order() {
        init_tracing();
        let (bus, mut rx) = bus();
        let config = ResequencerConfig::from_json(
            r#"{
                "capacity": 100,
                "timeout_ms": 1500,
                "comparator": { "sequence_number_key": "seqnum" },
                "target": { "service": "target" }
            }"#,
        )
        .unwrap();
        let endpoint = ResequencerEndpoint::start(config, Arc::clone(&bus), &Handle::current()).unwrap();

        for n in [4, 1, 3, 5, 2] {
            endpoint.process(numbered(n)).await.unwrap();
        }

        let mut received = Vec::new();
        while received.len() < 5 {
            let exchange = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(exchange.service, Some(QName::local("target")));
            received.push(seqnum(&exchange));
        }
        assert_eq!(received, vec![1, 2, 3, 4, 5]);

        let acks = bus.acks.lock().unwrap().clone();
        assert_eq!(acks.len(), 5);
        assert!(acks.iter().all(|e| e.status == ExchangeStatus::Done));

        let report = endpoint.shutdown().await.unwrap();
        assert_eq!(report.reader.delivered, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_message_delays_but_never_stalls() {
        init_tracing();
        let (bus, mut rx) = bus();
        let config = ResequencerConfig::new(100, ExchangeTarget::service(QName::local("target")))
            .with_comparator(DefaultComparator::with_key("seqnum").with_first(1))
            .with_timeout(Duration::from_millis(500));
        let endpoint = ResequencerEndpoint::start(config, bus, &Handle::current()).unwrap();

        endpoint.process(numbered(1)).await.unwrap();
        endpoint.process(numbered(3)).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(seqnum(&first), 1);

        let started = tokio::time::Instant::now();
        let second = rx.recv().await.unwrap();
        assert_eq!(seqnum(&second), 3);
        assert!(started.elapsed() >= Duration::from_millis(500));

        // the missing message turns up after its slot was passed
        endpoint.process(numbered(2)).await.unwrap();
        let late = rx.recv().await.unwrap();
        assert_eq!(seqnum(&late), 2);

        endpoint.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_with_small_buffer() {
        init_tracing();
        let (bus, mut rx) = bus();
        let config = ResequencerConfig::new(4, ExchangeTarget::service(QName::local("target")))
            .with_comparator(DefaultComparator::with_key("seqnum").with_first(1))
            .with_timeout(Duration::from_millis(50));
        let endpoint = Arc::new(ResequencerEndpoint::start(config, bus, &Handle::current()).unwrap());

        let mut producers = Vec::new();
        for lane in 0..4 {
            let endpoint = Arc::clone(&endpoint);
            producers.push(tokio::spawn(async move {
                for n in (1..=100).filter(|n| n % 4 == lane) {
                    endpoint.process(numbered(n)).await.unwrap();
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        let report = endpoint.shutdown().await.unwrap();
        assert!(report.discarded.is_empty());

        let mut received = Vec::new();
        while let Some(exchange) = rx.recv().await {
            received.push(seqnum(&exchange));
            if received.len() == 100 {
                break;
            }
        }
        received.sort_unstable();
        assert_eq!(received, (1..=100).collect::<Vec<i64>>());
    }
}
