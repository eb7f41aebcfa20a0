//! Rate-controlled publishing of synthetic events.

use crate::error::{PopulateError, Result};
use loadtest_generator::EventGenerator;
use pulsar_client::{Broker, ClientError, MessagePublisher, PublisherOptions};
use pulsar_types::OutboundMessage;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Upper bound on messages per batch.
pub const MAX_BATCH_SIZE: u32 = 100;

/// Messages between progress reports.
pub const PROGRESS_INTERVAL: u64 = 500;

const PUBLISHER_NAME: &str = "pulsar-snapshot-publisher";

/// Batch size for a target rate: a tenth of a second's worth of messages,
/// capped at [`MAX_BATCH_SIZE`] and never below one.
pub fn batch_size(rate: u32) -> u32 {
    (rate / 10).clamp(1, MAX_BATCH_SIZE)
}

/// Time one batch may take at the target rate.
pub fn batch_budget(batch_size: u32, rate: u32) -> Duration {
    Duration::from_secs_f64(f64::from(batch_size) / f64::from(rate.max(1)))
}

/// Metrics from a publish run.
#[derive(Debug, Clone, Default)]
pub struct PublishMetrics {
    /// Messages the broker acknowledged.
    pub messages_sent: u64,
    /// Messages rejected at enqueue or on flush.
    pub messages_failed: u64,
    /// Number of batches issued.
    pub batch_count: u64,
    /// Wall time from the first batch to the final flush.
    pub duration: Duration,
    /// Set when a shutdown signal stopped the run early.
    pub interrupted: bool,
}

impl PublishMetrics {
    pub fn messages_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.messages_sent as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Publishes generated events to one topic at a fixed rate.
pub struct SyntheticPublisher<'a> {
    broker: &'a dyn Broker,
    max_in_flight: usize,
}

/// Progress of the batch loop.
#[derive(Default)]
struct LoopState {
    enqueued: u64,
    enqueue_failed: u64,
    batches: u64,
    interrupted: bool,
}

impl<'a> SyntheticPublisher<'a> {
    pub fn new(broker: &'a dyn Broker) -> Self {
        Self {
            broker,
            max_in_flight: PublisherOptions::default().max_in_flight,
        }
    }

    /// Limit the number of unacknowledged sends.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Publish `count` events to `topic` at `rate` messages per second.
    ///
    /// Stops early when `shutdown` fires, including while waiting between
    /// batches. The publisher is flushed and closed on every path once it
    /// has been opened.
    pub async fn publish(
        &self,
        topic: &str,
        count: u64,
        rate: u32,
        generator: &mut EventGenerator,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<PublishMetrics> {
        if rate == 0 {
            return Err(PopulateError::InvalidRate(rate));
        }

        let batch_size = batch_size(rate);
        let options = PublisherOptions {
            name: Some(PUBLISHER_NAME.to_string()),
            ..PublisherOptions::default()
        }
        .with_batch_size(batch_size)
        .with_max_in_flight(self.max_in_flight);
        let mut publisher = self.broker.open_publisher(topic, options).await?;

        info!(
            "Publishing {count} messages at {rate}/sec to {topic} (batch size: {batch_size}, project ID: {})",
            generator.project_id()
        );

        let start = Instant::now();
        let mut state = LoopState::default();
        let loop_result = run_batches(
            &mut *publisher,
            count,
            rate,
            generator,
            &mut shutdown,
            &mut state,
            start,
        )
        .await;

        let mut metrics = PublishMetrics {
            messages_failed: state.enqueue_failed,
            batch_count: state.batches,
            interrupted: state.interrupted,
            ..Default::default()
        };

        match publisher.flush().await {
            Ok(outcome) => {
                metrics.messages_sent = outcome.delivered;
                metrics.messages_failed += outcome.failed;
            }
            Err(ClientError::Flush {
                reason,
                settled,
                unsettled,
                ..
            }) => {
                warn!("Failed to flush publisher on {topic}: {reason} ({unsettled} sends abandoned)");
                metrics.messages_sent = settled.delivered;
                metrics.messages_failed += settled.failed + unsettled;
            }
            Err(e) => {
                warn!("Failed to flush publisher on {topic}: {e}");
                metrics.messages_failed += state.enqueued;
            }
        }
        if let Err(e) = publisher.close().await {
            warn!("Failed to close publisher on {topic}: {e}");
        }
        metrics.duration = start.elapsed();
        loop_result?;

        if metrics.interrupted {
            info!("Stopped. Sent {} messages.", metrics.messages_sent);
        }
        info!(
            "Completed! Sent {} messages in {:.1}s (avg rate: {:.1}/sec, {} failed)",
            metrics.messages_sent,
            metrics.duration.as_secs_f64(),
            metrics.messages_per_second(),
            metrics.messages_failed
        );

        Ok(metrics)
    }
}

async fn run_batches(
    publisher: &mut dyn MessagePublisher,
    count: u64,
    rate: u32,
    generator: &mut EventGenerator,
    shutdown: &mut broadcast::Receiver<()>,
    state: &mut LoopState,
    start: Instant,
) -> Result<()> {
    let batch_size = batch_size(rate);
    let budget = batch_budget(batch_size, rate);
    let mut attempted = 0u64;
    let mut next_progress = PROGRESS_INTERVAL;

    while attempted < count {
        if shutdown_requested(shutdown) {
            state.interrupted = true;
            break;
        }

        let batch_start = Instant::now();
        let in_batch = (count - attempted).min(u64::from(batch_size));
        for _ in 0..in_batch {
            let payload = generator.generate().to_json_bytes()?;
            match publisher.send_async(OutboundMessage::new(payload)).await {
                Ok(()) => state.enqueued += 1,
                Err(e) => {
                    debug!("Failed to enqueue message: {e}");
                    state.enqueue_failed += 1;
                }
            }
        }
        attempted += in_batch;
        state.batches += 1;

        if attempted >= next_progress || attempted == count {
            let elapsed = start.elapsed().as_secs_f64();
            let current_rate = if elapsed > 0.0 {
                attempted as f64 / elapsed
            } else {
                0.0
            };
            info!("Sent {attempted}/{count} messages (rate: {current_rate:.1}/sec)");
            while next_progress <= attempted {
                next_progress += PROGRESS_INTERVAL;
            }
        }

        if attempted < count {
            let remaining = budget.saturating_sub(batch_start.elapsed());
            if !remaining.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(remaining) => {}
                    Ok(()) = shutdown.recv() => {
                        state.interrupted = true;
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    match shutdown.try_recv() {
        Ok(()) | Err(TryRecvError::Lagged(_)) => true,
        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use loadtest_generator::EventPools;
    use pulsar_client::memory::InMemoryBroker;
    use pulsar_client::{FlushOutcome, MessageReader, ReaderOptions};

    const TOPIC: &str = "persistent://eventbus/org-1/post-ingestion-495";

    fn generator() -> EventGenerator {
        EventGenerator::new(495, EventPools::default(), Some(42)).unwrap()
    }

    #[test]
    fn test_batch_size() {
        assert_eq!(batch_size(1000), 100);
        assert_eq!(batch_size(5000), 100);
        assert_eq!(batch_size(500), 50);
        assert_eq!(batch_size(5), 1);
        assert_eq!(batch_size(1), 1);
    }

    #[test]
    fn test_batch_budget() {
        assert_eq!(batch_budget(100, 1000), Duration::from_millis(100));
        assert_eq!(batch_budget(1, 5), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_holds_target_rate() {
        let broker = InMemoryBroker::new();
        let (_tx, shutdown) = broadcast::channel(1);
        let mut generator = generator();

        let metrics = SyntheticPublisher::new(&broker)
            .publish(TOPIC, 10_000, 1000, &mut generator, shutdown)
            .await
            .unwrap();

        assert_eq!(metrics.messages_sent, 10_000);
        assert_eq!(metrics.messages_failed, 0);
        assert_eq!(metrics.batch_count, 100);
        assert!(!metrics.interrupted);
        assert!(
            metrics.duration >= Duration::from_secs(8)
                && metrics.duration <= Duration::from_secs(12),
            "took {:?}",
            metrics.duration
        );
        assert_eq!(broker.messages(TOPIC).len(), 10_000);
        assert_eq!(broker.open_publishers(), 0);

        let (_, options) = &broker.publishers_opened()[0];
        assert_eq!(options.batch_size, Some(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_payloads_are_events() {
        let broker = InMemoryBroker::new();
        let (_tx, shutdown) = broadcast::channel(1);
        let mut generator = generator();

        SyntheticPublisher::new(&broker)
            .publish(TOPIC, 3, 10, &mut generator, shutdown)
            .await
            .unwrap();

        let messages = broker.messages(TOPIC);
        assert_eq!(messages.len(), 3);
        for message in messages {
            let event: serde_json::Value = serde_json::from_slice(&message.payload).unwrap();
            assert_eq!(event["payload"]["projectId"], 495);
            assert_eq!(event["payload"]["docType"], "emailSend");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_between_batches() {
        let broker = InMemoryBroker::new();
        let (tx, shutdown) = broadcast::channel(1);
        let mut generator = generator();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2050)).await;
            let _ = tx.send(());
        });

        let metrics = SyntheticPublisher::new(&broker)
            .publish(TOPIC, 10_000, 1000, &mut generator, shutdown)
            .await
            .unwrap();

        assert!(metrics.interrupted);
        assert!(
            (1000..=3000).contains(&metrics.messages_sent),
            "sent {}",
            metrics.messages_sent
        );
        assert!(metrics.duration < Duration::from_secs(3));
        // Everything enqueued before the signal was flushed
        assert_eq!(broker.messages(TOPIC).len() as u64, metrics.messages_sent);
        assert_eq!(broker.open_publishers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_start_sends_nothing() {
        let broker = InMemoryBroker::new();
        let (tx, shutdown) = broadcast::channel(1);
        tx.send(()).unwrap();
        let mut generator = generator();

        let metrics = SyntheticPublisher::new(&broker)
            .publish(TOPIC, 100, 1000, &mut generator, shutdown)
            .await
            .unwrap();

        assert!(metrics.interrupted);
        assert_eq!(metrics.messages_sent, 0);
        assert_eq!(metrics.batch_count, 0);
        assert_eq!(broker.open_publishers(), 0);
    }

    #[tokio::test]
    async fn test_open_failure_is_an_error() {
        let broker = InMemoryBroker::new();
        broker.fail_open(TOPIC);
        let (_tx, shutdown) = broadcast::channel(1);
        let mut generator = generator();

        let result = SyntheticPublisher::new(&broker)
            .publish(TOPIC, 10, 100, &mut generator, shutdown)
            .await;
        assert!(matches!(result, Err(PopulateError::Client(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_with_partial_batches_does_not_stall() {
        // A batch of 30 never divides the 1000 send window
        let broker = InMemoryBroker::new();
        let (_tx, shutdown) = broadcast::channel(1);
        let mut generator = generator();

        let publisher = SyntheticPublisher::new(&broker);
        let run = publisher.publish(TOPIC, 2000, 300, &mut generator, shutdown);
        let metrics = tokio::time::timeout(Duration::from_secs(60), run)
            .await
            .expect("publisher stalled")
            .unwrap();

        assert_eq!(metrics.messages_sent, 2000);
        assert_eq!(metrics.messages_failed, 0);
        assert_eq!(broker.messages(TOPIC).len(), 2000);
        let (_, options) = &broker.publishers_opened()[0];
        assert_eq!(options.batch_size, Some(30));
    }

    /// Rejects every third enqueue and reports every fifth settled send as
    /// failed on flush. With `fail_flush` the flush errors out after settling
    /// all but the last five accepted sends.
    struct FlakyBroker {
        fail_flush: bool,
    }

    struct FlakyPublisher {
        calls: u64,
        accepted: u64,
        fail_flush: bool,
    }

    #[async_trait]
    impl Broker for FlakyBroker {
        async fn partitions(&self, topic: &str) -> pulsar_client::Result<Vec<String>> {
            Ok(vec![topic.to_string()])
        }

        async fn open_reader(
            &self,
            topic: &str,
            _options: ReaderOptions,
        ) -> pulsar_client::Result<Box<dyn MessageReader>> {
            Err(ClientError::OpenReader {
                topic: topic.to_string(),
                reason: "unsupported".to_string(),
            })
        }

        async fn open_publisher(
            &self,
            _topic: &str,
            _options: PublisherOptions,
        ) -> pulsar_client::Result<Box<dyn MessagePublisher>> {
            Ok(Box::new(FlakyPublisher {
                calls: 0,
                accepted: 0,
                fail_flush: self.fail_flush,
            }))
        }
    }

    #[async_trait]
    impl MessagePublisher for FlakyPublisher {
        fn topic(&self) -> &str {
            TOPIC
        }

        async fn send(&mut self, _message: OutboundMessage) -> pulsar_client::Result<()> {
            Ok(())
        }

        async fn send_async(&mut self, _message: OutboundMessage) -> pulsar_client::Result<()> {
            self.calls += 1;
            if self.calls % 3 == 0 {
                return Err(ClientError::Send {
                    topic: TOPIC.to_string(),
                    reason: "queue full".to_string(),
                });
            }
            self.accepted += 1;
            Ok(())
        }

        async fn flush(&mut self) -> pulsar_client::Result<FlushOutcome> {
            let unsettled = if self.fail_flush { self.accepted.min(5) } else { 0 };
            let settled = self.accepted - unsettled;
            let failed = settled / 5;
            let outcome = FlushOutcome {
                delivered: settled - failed,
                failed,
            };
            self.accepted = 0;
            if self.fail_flush {
                return Err(ClientError::Flush {
                    topic: TOPIC.to_string(),
                    reason: "connection lost".to_string(),
                    settled: outcome,
                    unsettled,
                });
            }
            Ok(outcome)
        }

        async fn close(&mut self) -> pulsar_client::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_counted() {
        let broker = FlakyBroker { fail_flush: false };
        let (_tx, shutdown) = broadcast::channel(1);
        let mut generator = generator();

        let metrics = SyntheticPublisher::new(&broker)
            .publish(TOPIC, 30, 100, &mut generator, shutdown)
            .await
            .unwrap();

        // 10 rejected at enqueue, 20 accepted of which 4 fail on flush
        assert_eq!(metrics.messages_sent, 16);
        assert_eq!(metrics.messages_failed, 14);
        assert!(!metrics.interrupted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_counts_each_message_once() {
        let broker = FlakyBroker { fail_flush: true };
        let (_tx, shutdown) = broadcast::channel(1);
        let mut generator = generator();

        let metrics = SyntheticPublisher::new(&broker)
            .publish(TOPIC, 30, 100, &mut generator, shutdown)
            .await
            .unwrap();

        // 10 rejected at enqueue; of 20 accepted, 15 settled (3 failed) and
        // 5 were abandoned by the failed flush
        assert_eq!(metrics.messages_sent, 12);
        assert_eq!(metrics.messages_failed, 18);
        assert_eq!(metrics.messages_sent + metrics.messages_failed, 30);
    }
}
