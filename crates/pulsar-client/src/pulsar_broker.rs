//! [`Broker`] backed by the `pulsar` crate.

use async_trait::async_trait;
use futures::StreamExt;
use pulsar::consumer::{ConsumerOptions, InitialPosition};
use pulsar::producer::Message as ProducerMessage;
use pulsar::reader::Reader;
use pulsar::{Authentication, Producer, ProducerOptions, Pulsar, TokioExecutor};
use pulsar_types::{OutboundMessage, RawMessage};
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::window::{BatchSink, Receipt, SendWindow};
use crate::{
    Broker, FlushOutcome, MessagePublisher, MessageReader, PublisherOptions, ReaderOptions,
    StartPosition,
};

/// Longest a partially filled batch waits before it is sent.
const BATCH_TIMEOUT: Duration = Duration::from_millis(50);

/// Connection to a Pulsar cluster over the binary protocol.
#[derive(Clone)]
pub struct PulsarBroker {
    client: Pulsar<TokioExecutor>,
    service_url: String,
}

impl PulsarBroker {
    /// Connect to `service_url` (`pulsar://` or `pulsar+ssl://`).
    ///
    /// A token, when given, is sent with the `token` authentication method.
    pub async fn connect(service_url: &str, token: Option<&str>) -> Result<Self> {
        let mut builder = Pulsar::builder(service_url, TokioExecutor);
        if let Some(token) = token {
            builder = builder.with_auth(Authentication {
                name: "token".to_string(),
                data: token.as_bytes().to_vec(),
            });
        }

        let client = builder.build().await.map_err(|e| ClientError::Connect {
            url: service_url.to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!("Connected to Pulsar at {service_url}");

        Ok(Self {
            client,
            service_url: service_url.to_string(),
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }
}

#[async_trait]
impl Broker for PulsarBroker {
    async fn partitions(&self, topic: &str) -> Result<Vec<String>> {
        let partitions = self
            .client
            .lookup_partitioned_topic(topic)
            .await
            .map_err(|e| ClientError::OpenReader {
                topic: topic.to_string(),
                reason: format!("partition lookup failed: {e}"),
            })?;
        Ok(partitions.into_iter().map(|(name, _)| name).collect())
    }

    async fn open_reader(
        &self,
        topic: &str,
        options: ReaderOptions,
    ) -> Result<Box<dyn MessageReader>> {
        let initial_position = match options.start {
            StartPosition::Earliest => InitialPosition::Earliest,
            StartPosition::Latest => InitialPosition::Latest,
        };

        let mut builder = self
            .client
            .reader()
            .with_topic(topic)
            .with_options(ConsumerOptions::default().with_initial_position(initial_position));
        if let Some(name) = options.name {
            builder = builder.with_consumer_name(name);
        }

        let reader = builder
            .into_reader::<Vec<u8>>()
            .await
            .map_err(|e| ClientError::OpenReader {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(PulsarReader {
            topic: topic.to_string(),
            reader: Some(reader),
        }))
    }

    async fn open_publisher(
        &self,
        topic: &str,
        options: PublisherOptions,
    ) -> Result<Box<dyn MessagePublisher>> {
        let mut builder = self
            .client
            .producer()
            .with_topic(topic)
            .with_options(ProducerOptions {
                batch_size: options.batch_size,
                batch_timeout: options.batch_size.map(|_| BATCH_TIMEOUT),
                ..Default::default()
            });
        if let Some(name) = options.name {
            builder = builder.with_name(name);
        }

        let producer = builder.build().await.map_err(|e| ClientError::OpenPublisher {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Box::new(PulsarPublisher {
            topic: topic.to_string(),
            producer: Some(producer),
            window: SendWindow::new(topic, options.max_in_flight),
        }))
    }
}

struct PulsarReader {
    topic: String,
    reader: Option<Reader<Vec<u8>, TokioExecutor>>,
}

#[async_trait]
impl MessageReader for PulsarReader {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn read_next(&mut self, timeout: Duration) -> Result<Option<RawMessage>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| ClientError::Closed(self.topic.clone()))?;

        match tokio::time::timeout(timeout, reader.next()).await {
            Err(_) => Ok(None),
            Ok(None) => Ok(None),
            Ok(Some(Err(e))) => Err(ClientError::Read {
                topic: self.topic.clone(),
                reason: e.to_string(),
            }),
            Ok(Some(Ok(message))) => {
                let metadata = &message.payload.metadata;
                Ok(Some(RawMessage {
                    payload: message.payload.data.clone(),
                    properties: metadata
                        .properties
                        .iter()
                        .map(|kv| (kv.key.clone(), kv.value.clone()))
                        .collect(),
                    publish_timestamp: metadata.publish_time as i64,
                    event_timestamp: metadata.event_time.unwrap_or(0) as i64,
                    partition_key: metadata.partition_key.clone(),
                }))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the reader unsubscribes its non-durable cursor
        if self.reader.take().is_some() {
            tracing::debug!("Closed reader on {}", self.topic);
        }
        Ok(())
    }
}

struct PulsarPublisher {
    topic: String,
    producer: Option<Producer<TokioExecutor>>,
    window: SendWindow,
}

fn to_producer_message(message: OutboundMessage) -> ProducerMessage {
    ProducerMessage {
        payload: message.payload,
        properties: message.properties.into_iter().collect(),
        partition_key: message.partition_key,
        event_time: message.event_timestamp.and_then(|t| u64::try_from(t).ok()),
        ..Default::default()
    }
}

#[async_trait]
impl BatchSink for Producer<TokioExecutor> {
    async fn enqueue(&mut self, message: OutboundMessage) -> std::result::Result<Receipt, String> {
        let receipt = self
            .send_non_blocking(to_producer_message(message))
            .await
            .map_err(|e| e.to_string())?;
        Ok(Box::pin(async move {
            receipt.await.map(|_| ()).map_err(|e| e.to_string())
        }))
    }

    async fn send_batch(&mut self) -> std::result::Result<(), String> {
        Producer::send_batch(self).await.map_err(|e| e.to_string())
    }
}

impl PulsarPublisher {
    fn producer(&mut self) -> Result<&mut Producer<TokioExecutor>> {
        self.producer
            .as_mut()
            .ok_or_else(|| ClientError::Closed(self.topic.clone()))
    }
}

#[async_trait]
impl MessagePublisher for PulsarPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn send(&mut self, message: OutboundMessage) -> Result<()> {
        let topic = self.topic.clone();
        let send_error = |reason: String| ClientError::Send {
            topic: topic.clone(),
            reason,
        };

        let producer = self.producer()?;
        let receipt = BatchSink::enqueue(&mut *producer, message)
            .await
            .map_err(send_error)?;
        BatchSink::send_batch(&mut *producer)
            .await
            .map_err(send_error)?;
        receipt.await.map_err(send_error)
    }

    async fn send_async(&mut self, message: OutboundMessage) -> Result<()> {
        let producer = self
            .producer
            .as_mut()
            .ok_or_else(|| ClientError::Closed(self.topic.clone()))?;
        self.window.send_async(producer, message).await
    }

    async fn flush(&mut self) -> Result<FlushOutcome> {
        let producer = self
            .producer
            .as_mut()
            .ok_or_else(|| ClientError::Closed(self.topic.clone()))?;
        self.window.flush(producer).await
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut producer) = self.producer.take() else {
            return Ok(());
        };
        if self.window.unsettled() > 0 {
            tracing::debug!(
                "Closing publisher on {} with {} unsettled sends",
                self.topic,
                self.window.unsettled()
            );
        }
        producer.close().await.map_err(|e| ClientError::Send {
            topic: self.topic.clone(),
            reason: format!("close failed: {e}"),
        })?;
        tracing::debug!("Closed publisher on {}", self.topic);
        Ok(())
    }
}
