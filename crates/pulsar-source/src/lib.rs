//! Bounded message capture.
//!
//! A capture opens a non-durable reader at the earliest retained message and
//! reads until one of three things happens: `max_messages` have been read, no
//! message arrives within `read_timeout`, or the read fails. The last two are
//! how the end of a topic shows up and are not errors.
//!
//! A partitioned topic is read through one reader per shard. The shards are
//! read in turn, one message at a time, so the bound is shared fairly, and
//! the merged set is ordered by publish time.

use anyhow::{Context, Result};
use pulsar_client::{Broker, MessageReader, ReaderOptions, StartPosition};
use pulsar_types::{CapturedMessage, TopicMessageSet};
use std::time::Duration;

/// Reader name reported to the broker for capture readers.
pub const CAPTURE_READER_NAME: &str = "pulsar-snapshot-capture";

/// Per-topic capture bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Maximum messages captured per topic
    pub max_messages: usize,
    /// How long to wait for each next message
    pub read_timeout: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_messages: 1000,
            read_timeout: Duration::from_secs(5),
        }
    }
}

/// Why a capture stopped reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEnd {
    /// `max_messages` were read
    Limit,
    /// Nothing arrived within the read timeout
    Timeout,
    /// The reader reported an error
    ReadError(String),
}

/// Reads bounded message sets from topics.
pub struct MessageCapture<'a> {
    broker: &'a dyn Broker,
    config: CaptureConfig,
}

impl<'a> MessageCapture<'a> {
    pub fn new(broker: &'a dyn Broker, config: CaptureConfig) -> Self {
        Self { broker, config }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Capture a topic's messages from the earliest retained position.
    ///
    /// Failing to open a reader is an error. Readers are closed on every
    /// path once open.
    pub async fn capture(&self, topic: &str) -> Result<TopicMessageSet> {
        let (set, _) = self.capture_with_end(topic).await?;
        Ok(set)
    }

    /// Like [`MessageCapture::capture`], also reporting why reading stopped.
    pub async fn capture_with_end(&self, topic: &str) -> Result<(TopicMessageSet, CaptureEnd)> {
        let partitions = self
            .broker
            .partitions(topic)
            .await
            .with_context(|| format!("Failed to look up partitions of {topic}"))?;

        let mut readers = Vec::with_capacity(partitions.len());
        for partition in &partitions {
            let options = ReaderOptions {
                start: StartPosition::Earliest,
                name: Some(CAPTURE_READER_NAME.to_string()),
            };
            match self.broker.open_reader(partition, options).await {
                Ok(reader) => readers.push(reader),
                Err(e) => {
                    close_all(&mut readers).await;
                    return Err(e).with_context(|| format!("Failed to open reader for {partition}"));
                }
            }
        }

        let (mut set, end) = self.drain(topic, &mut readers).await;
        close_all(&mut readers).await;

        if partitions.len() > 1 {
            set.messages.sort_by_key(|message| message.publish_timestamp);
        }

        match &end {
            CaptureEnd::Limit => {
                tracing::debug!("Reached the {} message limit on {topic}", self.config.max_messages)
            }
            CaptureEnd::Timeout => tracing::debug!(
                "Finished reading {topic}: no message within {:?}",
                self.config.read_timeout
            ),
            CaptureEnd::ReadError(reason) => {
                tracing::debug!("Finished reading {topic}: {reason}")
            }
        }

        Ok((set, end))
    }

    /// Read the readers in turn until the bound is hit, every reader has
    /// gone quiet, or one fails.
    async fn drain(
        &self,
        topic: &str,
        readers: &mut [Box<dyn MessageReader>],
    ) -> (TopicMessageSet, CaptureEnd) {
        let mut set = TopicMessageSet::new(topic);
        let mut active: Vec<usize> = (0..readers.len()).collect();

        while !active.is_empty() {
            let mut still_active = Vec::with_capacity(active.len());
            for index in active {
                if set.len() >= self.config.max_messages {
                    return (set, CaptureEnd::Limit);
                }
                match readers[index].read_next(self.config.read_timeout).await {
                    Ok(Some(raw)) => {
                        set.push(CapturedMessage::from(raw));
                        still_active.push(index);
                    }
                    Ok(None) => {}
                    Err(e) => return (set, CaptureEnd::ReadError(e.to_string())),
                }
            }
            active = still_active;
        }

        if set.len() >= self.config.max_messages {
            (set, CaptureEnd::Limit)
        } else {
            (set, CaptureEnd::Timeout)
        }
    }
}

async fn close_all(readers: &mut Vec<Box<dyn MessageReader>>) {
    for mut reader in readers.drain(..) {
        if let Err(e) = reader.close().await {
            tracing::warn!("Failed to close reader for {}: {e}", reader.topic());
        }
    }
}
