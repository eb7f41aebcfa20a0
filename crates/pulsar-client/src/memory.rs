//! In-process [`Broker`].
//!
//! Topics are plain vectors of [`RawMessage`]. Readers are non-destructive
//! and, once they reach the end of a topic, wait out the full read timeout
//! before reporting `None`, the way a live reader does.
//!
//! Two client behaviours are modelled because callers depend on them:
//! a partitioned topic can only be read through its shards, and a batching
//! publisher holds a partial batch until it fills up or is pushed out.

use async_trait::async_trait;
use pulsar_types::{partition_name, OutboundMessage, RawMessage};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::error::{ClientError, Result};
use crate::window::{BatchSink, Receipt, SendWindow};
use crate::{Broker, FlushOutcome, MessagePublisher, MessageReader, PublisherOptions, ReaderOptions};

/// First publish timestamp handed out by the broker.
const FIRST_PUBLISH_MS: i64 = 1_700_000_000_000;

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashMap<String, Vec<RawMessage>>,
    open_readers: usize,
    open_publishers: usize,
    publishers_opened: Vec<(String, PublisherOptions)>,
    failing_opens: HashSet<String>,
    failing_payloads: Vec<Vec<u8>>,
    read_failures: HashMap<String, usize>,
    partitioned: HashMap<String, u32>,
    clock_ms: i64,
    next_partition: u32,
}

impl BrokerState {
    /// Store a message. Sends to a partitioned parent go to its shards
    /// round-robin.
    fn deliver(&mut self, topic: &str, message: OutboundMessage) {
        self.clock_ms += 1;
        let publish_timestamp = FIRST_PUBLISH_MS + self.clock_ms;
        let target = match self.partitioned.get(topic) {
            Some(&partitions) => {
                let index = self.next_partition % partitions;
                self.next_partition = self.next_partition.wrapping_add(1);
                partition_name(topic, index)
            }
            None => topic.to_string(),
        };
        self.topics
            .entry(target)
            .or_default()
            .push(RawMessage {
                payload: message.payload,
                properties: message.properties,
                publish_timestamp,
                event_timestamp: message.event_timestamp.unwrap_or(0),
                partition_key: message.partition_key,
            });
    }

    fn rejects(&self, message: &OutboundMessage) -> bool {
        self.failing_payloads.iter().any(|p| *p == message.payload)
    }
}

/// A broker held in memory. Clones share the same topics.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

fn lock(state: &Mutex<BrokerState>) -> MutexGuard<'_, BrokerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append messages to a topic as if they had been published earlier.
    pub fn seed(&self, topic: &str, messages: impl IntoIterator<Item = RawMessage>) {
        lock(&self.state)
            .topics
            .entry(topic.to_string())
            .or_default()
            .extend(messages);
    }

    /// Messages currently stored on a topic, oldest first.
    pub fn messages(&self, topic: &str) -> Vec<RawMessage> {
        lock(&self.state)
            .topics
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Readers opened and not yet closed or dropped.
    pub fn open_readers(&self) -> usize {
        lock(&self.state).open_readers
    }

    /// Publishers opened and not yet closed or dropped.
    pub fn open_publishers(&self) -> usize {
        lock(&self.state).open_publishers
    }

    /// Every publisher ever opened with its options.
    pub fn publishers_opened(&self) -> Vec<(String, PublisherOptions)> {
        lock(&self.state).publishers_opened.clone()
    }

    /// Refuse to open readers or publishers on this topic.
    pub fn fail_open(&self, topic: &str) {
        lock(&self.state).failing_opens.insert(topic.to_string());
    }

    /// Reject every send whose payload equals `payload`.
    pub fn fail_payload(&self, payload: impl Into<Vec<u8>>) {
        lock(&self.state).failing_payloads.push(payload.into());
    }

    /// Register `topic` as partitioned with `partitions` shards. Seed and
    /// inspect the shards by their `-partition-N` names.
    pub fn create_partitioned(&self, topic: &str, partitions: u32) {
        lock(&self.state)
            .partitioned
            .insert(topic.to_string(), partitions.max(1));
    }

    /// Make reads on this topic fail once `after` messages have been read.
    pub fn fail_reads_after(&self, topic: &str, after: usize) {
        lock(&self.state)
            .read_failures
            .insert(topic.to_string(), after);
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn partitions(&self, topic: &str) -> Result<Vec<String>> {
        let state = lock(&self.state);
        Ok(match state.partitioned.get(topic) {
            Some(&partitions) => (0..partitions)
                .map(|index| partition_name(topic, index))
                .collect(),
            None => vec![topic.to_string()],
        })
    }

    async fn open_reader(
        &self,
        topic: &str,
        _options: ReaderOptions,
    ) -> Result<Box<dyn MessageReader>> {
        let mut state = lock(&self.state);
        if state.failing_opens.contains(topic) {
            return Err(ClientError::OpenReader {
                topic: topic.to_string(),
                reason: "topic unavailable".to_string(),
            });
        }
        if state.partitioned.contains_key(topic) {
            return Err(ClientError::OpenReader {
                topic: topic.to_string(),
                reason: "Unable to create a reader - one topic partition max".to_string(),
            });
        }
        state.open_readers += 1;
        Ok(Box::new(InMemoryReader {
            topic: topic.to_string(),
            state: Arc::clone(&self.state),
            cursor: 0,
            open: true,
        }))
    }

    async fn open_publisher(
        &self,
        topic: &str,
        options: PublisherOptions,
    ) -> Result<Box<dyn MessagePublisher>> {
        let mut state = lock(&self.state);
        if state.failing_opens.contains(topic) {
            return Err(ClientError::OpenPublisher {
                topic: topic.to_string(),
                reason: "topic unavailable".to_string(),
            });
        }
        state.open_publishers += 1;
        state
            .publishers_opened
            .push((topic.to_string(), options.clone()));
        Ok(Box::new(InMemoryPublisher {
            topic: topic.to_string(),
            sink: InMemorySink {
                state: Arc::clone(&self.state),
                topic: topic.to_string(),
                batch_size: options.batch_size.map_or(1, |size| size.max(1) as usize),
                batch: Vec::new(),
            },
            window: SendWindow::new(topic, options.max_in_flight),
            open: true,
        }))
    }
}

struct InMemoryReader {
    topic: String,
    state: Arc<Mutex<BrokerState>>,
    cursor: usize,
    open: bool,
}

impl InMemoryReader {
    fn release(&mut self) {
        if self.open {
            self.open = false;
            lock(&self.state).open_readers -= 1;
        }
    }
}

impl Drop for InMemoryReader {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl MessageReader for InMemoryReader {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn read_next(&mut self, timeout: Duration) -> Result<Option<RawMessage>> {
        if !self.open {
            return Err(ClientError::Closed(self.topic.clone()));
        }

        let next = {
            let state = lock(&self.state);
            if let Some(after) = state.read_failures.get(&self.topic) {
                if self.cursor >= *after {
                    return Err(ClientError::Read {
                        topic: self.topic.clone(),
                        reason: "connection reset".to_string(),
                    });
                }
            }
            state
                .topics
                .get(&self.topic)
                .and_then(|messages| messages.get(self.cursor))
                .cloned()
        };

        match next {
            Some(message) => {
                self.cursor += 1;
                Ok(Some(message))
            }
            None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }
}

type Ack = oneshot::Sender<std::result::Result<(), String>>;

/// The producer side of an in-memory publisher.
struct InMemorySink {
    state: Arc<Mutex<BrokerState>>,
    topic: String,
    batch_size: usize,
    batch: Vec<(OutboundMessage, Ack)>,
}

impl InMemorySink {
    fn dispatch(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let mut state = lock(&self.state);
        for (message, ack) in self.batch.drain(..) {
            let result = if state.rejects(&message) {
                Err("rejected by broker".to_string())
            } else {
                state.deliver(&self.topic, message);
                Ok(())
            };
            let _ = ack.send(result);
        }
    }
}

#[async_trait]
impl BatchSink for InMemorySink {
    async fn enqueue(&mut self, message: OutboundMessage) -> std::result::Result<Receipt, String> {
        let (ack, receipt) = oneshot::channel();
        self.batch.push((message, ack));
        if self.batch.len() >= self.batch_size {
            self.dispatch();
        }
        Ok(Box::pin(async move {
            receipt
                .await
                .map_err(|_| "batch dropped before it was sent".to_string())?
        }))
    }

    async fn send_batch(&mut self) -> std::result::Result<(), String> {
        self.dispatch();
        Ok(())
    }
}

struct InMemoryPublisher {
    topic: String,
    sink: InMemorySink,
    window: SendWindow,
    open: bool,
}

impl InMemoryPublisher {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(ClientError::Closed(self.topic.clone()))
        }
    }

    fn release(&mut self) {
        if self.open {
            self.open = false;
            lock(&self.sink.state).open_publishers -= 1;
        }
    }
}

impl Drop for InMemoryPublisher {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl MessagePublisher for InMemoryPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn send(&mut self, message: OutboundMessage) -> Result<()> {
        self.ensure_open()?;
        let send_error = |reason: String| ClientError::Send {
            topic: self.topic.clone(),
            reason,
        };
        let receipt = self.sink.enqueue(message).await.map_err(send_error)?;
        self.sink.send_batch().await.map_err(send_error)?;
        receipt.await.map_err(send_error)
    }

    async fn send_async(&mut self, message: OutboundMessage) -> Result<()> {
        self.ensure_open()?;
        self.window.send_async(&mut self.sink, message).await
    }

    async fn flush(&mut self) -> Result<FlushOutcome> {
        self.ensure_open()?;
        self.window.flush(&mut self.sink).await
    }

    async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.sink.dispatch();
        self.release();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn raw(payload: &str) -> RawMessage {
        RawMessage {
            payload: payload.as_bytes().to_vec(),
            properties: BTreeMap::new(),
            publish_timestamp: 1,
            event_timestamp: 0,
            partition_key: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reader_is_non_destructive() {
        let broker = InMemoryBroker::new();
        broker.seed("persistent://t/ns/a", [raw("one"), raw("two")]);

        for _ in 0..2 {
            let mut reader = broker
                .open_reader("persistent://t/ns/a", ReaderOptions::default())
                .await
                .unwrap();
            let timeout = Duration::from_secs(5);
            assert_eq!(reader.read_next(timeout).await.unwrap(), Some(raw("one")));
            assert_eq!(reader.read_next(timeout).await.unwrap(), Some(raw("two")));
            assert_eq!(reader.read_next(timeout).await.unwrap(), None);
            reader.close().await.unwrap();
        }

        assert_eq!(broker.messages("persistent://t/ns/a").len(), 2);
        assert_eq!(broker.open_readers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_reader_waits_for_timeout() {
        let broker = InMemoryBroker::new();
        let mut reader = broker
            .open_reader("persistent://t/ns/empty", ReaderOptions::default())
            .await
            .unwrap();

        let start = tokio::time::Instant::now();
        assert_eq!(reader.read_next(Duration::from_secs(3)).await.unwrap(), None);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_dropped_reader_is_released() {
        let broker = InMemoryBroker::new();
        let reader = broker
            .open_reader("persistent://t/ns/a", ReaderOptions::default())
            .await
            .unwrap();
        assert_eq!(broker.open_readers(), 1);
        drop(reader);
        assert_eq!(broker.open_readers(), 0);
    }

    #[tokio::test]
    async fn test_async_sends_land_on_flush() {
        let broker = InMemoryBroker::new();
        broker.fail_payload("bad");
        let mut publisher = broker
            .open_publisher(
                "persistent://t/ns/a",
                PublisherOptions::default().with_batch_size(10),
            )
            .await
            .unwrap();

        publisher.send_async(OutboundMessage::new("a")).await.unwrap();
        publisher.send_async(OutboundMessage::new("bad")).await.unwrap();
        publisher.send_async(OutboundMessage::new("b")).await.unwrap();
        assert!(broker.messages("persistent://t/ns/a").is_empty());

        let outcome = publisher.flush().await.unwrap();
        assert_eq!(outcome, FlushOutcome { delivered: 2, failed: 1 });
        assert_eq!(broker.messages("persistent://t/ns/a").len(), 2);

        publisher.close().await.unwrap();
        assert_eq!(broker.open_publishers(), 0);
        assert!(publisher.send(OutboundMessage::new("c")).await.is_err());
    }

    #[tokio::test]
    async fn test_in_flight_bound_drains_early() {
        let broker = InMemoryBroker::new();
        let mut publisher = broker
            .open_publisher(
                "persistent://t/ns/a",
                PublisherOptions::default()
                    .with_batch_size(10)
                    .with_max_in_flight(2),
            )
            .await
            .unwrap();

        for payload in ["1", "2", "3"] {
            publisher.send_async(OutboundMessage::new(payload)).await.unwrap();
        }
        assert_eq!(broker.messages("persistent://t/ns/a").len(), 2);

        let outcome = publisher.flush().await.unwrap();
        assert_eq!(outcome.delivered, 3);
    }

    #[tokio::test]
    async fn test_sync_send_failure() {
        let broker = InMemoryBroker::new();
        broker.fail_payload(vec![0xff]);
        let mut publisher = broker
            .open_publisher("persistent://t/ns/a", PublisherOptions::default())
            .await
            .unwrap();

        let err = publisher
            .send(OutboundMessage::new(vec![0xff]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Send { .. }));
    }

    #[tokio::test]
    async fn test_publish_timestamps_increase() {
        let broker = InMemoryBroker::new();
        let mut publisher = broker
            .open_publisher("persistent://t/ns/a", PublisherOptions::default())
            .await
            .unwrap();
        publisher.send(OutboundMessage::new("x")).await.unwrap();
        publisher.send(OutboundMessage::new("y")).await.unwrap();

        let stored = broker.messages("persistent://t/ns/a");
        assert!(stored[0].publish_timestamp < stored[1].publish_timestamp);
        assert_eq!(stored[0].event_timestamp, 0);
    }

    #[tokio::test]
    async fn test_unbatched_sends_go_out_immediately() {
        let broker = InMemoryBroker::new();
        let mut publisher = broker
            .open_publisher("persistent://t/ns/a", PublisherOptions::default())
            .await
            .unwrap();
        publisher.send_async(OutboundMessage::new("a")).await.unwrap();
        assert_eq!(broker.messages("persistent://t/ns/a").len(), 1);
        assert_eq!(publisher.flush().await.unwrap().delivered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_batch_does_not_stall_full_window() {
        let broker = InMemoryBroker::new();
        let mut publisher = broker
            .open_publisher(
                "persistent://t/ns/a",
                PublisherOptions::default()
                    .with_batch_size(30)
                    .with_max_in_flight(1000),
            )
            .await
            .unwrap();

        let sends = async {
            for _ in 0..2500 {
                publisher.send_async(OutboundMessage::new("x")).await.unwrap();
            }
        };
        tokio::time::timeout(Duration::from_secs(5), sends)
            .await
            .expect("sends stalled on an unsent batch");

        // The window drained twice, each time pushing out a ten message
        // remainder; the last 20 sends still wait in an unfilled batch
        assert_eq!(broker.messages("persistent://t/ns/a").len(), 2480);
        let outcome = publisher.flush().await.unwrap();
        assert_eq!(outcome, FlushOutcome { delivered: 2500, failed: 0 });
        assert_eq!(broker.messages("persistent://t/ns/a").len(), 2500);
    }

    #[tokio::test]
    async fn test_partitioned_parent_is_read_through_shards() {
        let broker = InMemoryBroker::new();
        broker.create_partitioned("persistent://t/ns/events", 2);

        assert_eq!(
            broker.partitions("persistent://t/ns/events").await.unwrap(),
            vec![
                "persistent://t/ns/events-partition-0",
                "persistent://t/ns/events-partition-1",
            ]
        );
        assert_eq!(
            broker.partitions("persistent://t/ns/a").await.unwrap(),
            vec!["persistent://t/ns/a"]
        );

        let err = broker
            .open_reader("persistent://t/ns/events", ReaderOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ClientError::OpenReader { .. }));
        assert_eq!(broker.open_readers(), 0);
        assert!(broker
            .open_reader("persistent://t/ns/events-partition-1", ReaderOptions::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_sends_to_partitioned_parent_are_spread() {
        let broker = InMemoryBroker::new();
        broker.create_partitioned("persistent://t/ns/events", 2);
        let mut publisher = broker
            .open_publisher("persistent://t/ns/events", PublisherOptions::default())
            .await
            .unwrap();
        for payload in ["a", "b", "c"] {
            publisher.send(OutboundMessage::new(payload)).await.unwrap();
        }

        assert_eq!(broker.messages("persistent://t/ns/events-partition-0").len(), 2);
        assert_eq!(broker.messages("persistent://t/ns/events-partition-1").len(), 1);
        assert!(broker.messages("persistent://t/ns/events").is_empty());
    }
}
