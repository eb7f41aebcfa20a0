//! Replay: republish every captured message set.

use anyhow::Context;
use pulsar_client::Broker;
use pulsar_snapshot_sink::MessageReplay;
use snapshot_store::{FilesystemStore, SnapshotStore};

use crate::{AppConfig, ClusterOpts, SnapshotOpts};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub topics: usize,
    pub replayed: usize,
    pub failed: usize,
    pub skipped_topics: usize,
}

/// Replay the message sets of every topic listed in the snapshot.
///
/// Topics are taken from the canonical topic list, so a message file is only
/// ever looked up from its topic name and never decoded back from a path.
pub async fn replay_snapshot(
    broker: &dyn Broker,
    store: &dyn SnapshotStore,
) -> anyhow::Result<ReplaySummary> {
    let topology = store
        .read_topology()
        .await
        .context("Failed to read the captured topology")?;
    let replay = MessageReplay::new(broker);
    let mut summary = ReplaySummary::default();

    for topic in &topology.topics {
        let messages = match store.read_messages(topic).await {
            Ok(Some(messages)) if !messages.is_empty() => messages,
            Ok(_) => {
                tracing::debug!("No captured messages for {topic}");
                continue;
            }
            Err(e) => {
                tracing::warn!("Skipping {topic}: {e:#}");
                summary.skipped_topics += 1;
                continue;
            }
        };

        match replay.replay(&messages).await {
            Ok(report) => {
                summary.topics += 1;
                summary.replayed += report.replayed;
                summary.failed += report.failed;
            }
            Err(e) => {
                tracing::warn!("Skipping {topic}: {e:#}");
                summary.skipped_topics += 1;
            }
        }
    }

    Ok(summary)
}

pub async fn run(cluster: ClusterOpts, snapshot: SnapshotOpts) -> anyhow::Result<()> {
    let mut config = AppConfig::load(&cluster)?;
    config.authenticate().await;
    let broker = config.connect_broker().await?;

    let store = FilesystemStore::new(&snapshot.snapshot_dir);
    let summary = replay_snapshot(&broker, &store).await?;
    tracing::info!(
        "Replay completed: {} messages to {} topics ({} failed, {} topics skipped)",
        summary.replayed,
        summary.topics,
        summary.failed,
        summary.skipped_topics
    );
    Ok(())
}
