use anyhow::{Context, Result};
use pulsar_client::{Broker, PublisherOptions};
use pulsar_types::TopicMessageSet;

/// Outcome of replaying one topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub topic: String,
    pub replayed: usize,
    pub failed: usize,
}

/// Republishes captured message sets.
///
/// Messages are sent one at a time with a synchronous send so they land in
/// capture order. A failed send is counted and replay moves on.
pub struct MessageReplay<'a> {
    broker: &'a dyn Broker,
}

impl<'a> MessageReplay<'a> {
    pub fn new(broker: &'a dyn Broker) -> Self {
        Self { broker }
    }

    pub async fn replay(&self, messages: &TopicMessageSet) -> Result<ReplayReport> {
        let topic = messages.topic.as_str();
        let mut publisher = self
            .broker
            .open_publisher(topic, PublisherOptions::default())
            .await
            .with_context(|| format!("Failed to open publisher for {topic}"))?;

        tracing::info!("Replaying {} messages to {topic}", messages.len());

        let mut report = ReplayReport {
            topic: topic.to_string(),
            ..Default::default()
        };

        for (index, message) in messages.messages.iter().enumerate() {
            match publisher.send(message.to_outbound()).await {
                Ok(()) => report.replayed += 1,
                Err(e) => {
                    tracing::warn!("Failed to replay message #{} to {topic}: {e}", index + 1);
                    report.failed += 1;
                }
            }
        }

        if let Err(e) = publisher.flush().await {
            tracing::warn!("Failed to flush publisher for {topic}: {e}");
        }
        if let Err(e) = publisher.close().await {
            tracing::warn!("Failed to close publisher for {topic}: {e}");
        }

        tracing::info!(
            "Replayed {} messages to {topic} ({} failed)",
            report.replayed,
            report.failed
        );
        Ok(report)
    }
}
