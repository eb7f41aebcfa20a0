//! Print: dump the messages of every topic in the cluster.

use pulsar_admin::DirectoryClient;
use pulsar_client::Broker;
use pulsar_snapshot_source::{CaptureConfig, CaptureEnd, MessageCapture};
use pulsar_types::{CapturedMessage, TopicMessageSet};
use std::io::{self, Write};

use super::discover_topology;
use crate::{AppConfig, ClusterOpts, SnapshotOpts};

/// Write one message in the human-readable dump format.
pub fn write_message(
    out: &mut impl Write,
    number: usize,
    message: &CapturedMessage,
) -> io::Result<()> {
    let (content, binary_encoded) = message.payload.encode();
    writeln!(out, "\nMessage #{number}")?;
    writeln!(out, "Content: {content}")?;
    if binary_encoded {
        writeln!(out, "(Content is base64-encoded binary data)")?;
    }
    if !message.properties.is_empty() {
        let properties = serde_json::to_string_pretty(&message.properties)
            .map_err(io::Error::other)?;
        writeln!(out, "Properties: {properties}")?;
    }
    writeln!(out, "Publish timestamp: {}", message.publish_timestamp)?;
    if message.event_timestamp != 0 {
        writeln!(out, "Event timestamp: {}", message.event_timestamp)?;
    }
    if let Some(key) = &message.partition_key {
        writeln!(out, "Partition key: {key}")?;
    }
    Ok(())
}

/// Write a topic header, its messages and the per-topic total.
pub fn write_topic(
    out: &mut impl Write,
    messages: &TopicMessageSet,
    end: &CaptureEnd,
) -> io::Result<()> {
    writeln!(out, "\n=== TOPIC: {} ===", messages.topic)?;
    for (index, message) in messages.messages.iter().enumerate() {
        write_message(out, index + 1, message)?;
    }

    match end {
        CaptureEnd::ReadError(reason) if messages.is_empty() => {
            writeln!(out, "  No messages found: {reason}")?
        }
        CaptureEnd::ReadError(reason) => writeln!(out, "  Finished reading messages: {reason}")?,
        CaptureEnd::Timeout if messages.is_empty() => writeln!(out, "  No messages found")?,
        CaptureEnd::Timeout | CaptureEnd::Limit => {}
    }

    writeln!(
        out,
        "\nTotal messages read from {}: {}",
        messages.topic,
        messages.len()
    )
}

/// Read and print every canonical topic. Returns the number of messages
/// printed.
pub async fn print_all(
    directory: &dyn DirectoryClient,
    broker: &dyn Broker,
    config: CaptureConfig,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let discovery = discover_topology(directory).await;
    tracing::info!("Found {} topics", discovery.topology.topics.len());

    let capture = MessageCapture::new(broker, config);
    let mut total = 0;
    for topic in &discovery.topology.topics {
        match capture.capture_with_end(topic).await {
            Ok((messages, end)) => {
                write_topic(out, &messages, &end)?;
                total += messages.len();
            }
            Err(e) => tracing::warn!("Skipping {topic}: {e:#}"),
        }
    }
    writeln!(out, "\nPrinting completed.")?;
    Ok(total)
}

pub async fn run(cluster: ClusterOpts, snapshot: SnapshotOpts) -> anyhow::Result<()> {
    let capture_config = snapshot.capture_config()?;
    let mut config = AppConfig::load(&cluster)?;
    config.authenticate().await;

    let directory = config.directory_client()?;
    super::check_connection(&directory).await?;
    let broker = config.connect_broker().await?;

    print_all(&directory, &broker, capture_config, &mut io::stdout()).await?;
    Ok(())
}
