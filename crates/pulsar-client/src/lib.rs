//! Data-plane client for pulsar-snapshot.
//!
//! Capture, replay and the synthetic publisher only see the [`Broker`],
//! [`MessageReader`] and [`MessagePublisher`] traits. [`PulsarBroker`] speaks
//! the Pulsar binary protocol; [`memory::InMemoryBroker`] keeps topics in
//! process for tests.

pub mod error;
pub mod memory;
pub mod pulsar_broker;
mod window;

use async_trait::async_trait;
use pulsar_types::{OutboundMessage, RawMessage};
use std::time::Duration;

pub use error::{ClientError, Result};
pub use pulsar_broker::PulsarBroker;

/// Where a new reader starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPosition {
    /// Oldest retained message
    #[default]
    Earliest,
    /// Only messages published after the reader opens
    Latest,
}

#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    pub start: StartPosition,
    /// Reader name reported to the broker
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PublisherOptions {
    /// Client-side batching, `None` disables it
    pub batch_size: Option<u32>,
    /// Maximum unsettled `send_async` calls before the publisher drains them
    pub max_in_flight: usize,
    pub name: Option<String>,
}

impl Default for PublisherOptions {
    fn default() -> Self {
        Self {
            batch_size: None,
            max_in_flight: 1000,
            name: None,
        }
    }
}

impl PublisherOptions {
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }
}

/// Settled asynchronous sends since the previous flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    pub delivered: u64,
    pub failed: u64,
}

/// Opens readers and publishers on a cluster.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Topics a reader has to be opened on to see every message of `topic`:
    /// its shards when it is partitioned, otherwise the topic itself.
    ///
    /// Readers cannot be opened on a partitioned parent.
    async fn partitions(&self, topic: &str) -> Result<Vec<String>>;

    async fn open_reader(
        &self,
        topic: &str,
        options: ReaderOptions,
    ) -> Result<Box<dyn MessageReader>>;

    async fn open_publisher(
        &self,
        topic: &str,
        options: PublisherOptions,
    ) -> Result<Box<dyn MessagePublisher>>;
}

/// A non-durable cursor over one topic. Reading never acknowledges.
#[async_trait]
pub trait MessageReader: Send {
    fn topic(&self) -> &str;

    /// Wait up to `timeout` for the next message.
    ///
    /// Returns `Ok(None)` when nothing arrives in time or the topic ends.
    async fn read_next(&mut self, timeout: Duration) -> Result<Option<RawMessage>>;

    async fn close(&mut self) -> Result<()>;
}

/// A producer handle on one topic.
#[async_trait]
pub trait MessagePublisher: Send {
    fn topic(&self) -> &str;

    /// Send and wait for the broker receipt.
    async fn send(&mut self, message: OutboundMessage) -> Result<()>;

    /// Enqueue a send without waiting for its receipt.
    ///
    /// Errors returned here are enqueue failures. Delivery failures surface
    /// in the next [`FlushOutcome`]. Once `max_in_flight` sends are
    /// unsettled, the partial batch is pushed out and they are settled first.
    async fn send_async(&mut self, message: OutboundMessage) -> Result<()>;

    /// Push out buffered messages and settle every pending send.
    ///
    /// A failed flush returns [`ClientError::Flush`] with the sends settled
    /// before the failure.
    async fn flush(&mut self) -> Result<FlushOutcome>;

    async fn close(&mut self) -> Result<()>;
}
