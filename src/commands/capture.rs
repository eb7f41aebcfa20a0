//! Capture: topology discovery plus bounded message capture.

use anyhow::Context;
use pulsar_admin::{DirectoryClient, TopicReconciler, TopicSet};
use pulsar_client::Broker;
use pulsar_snapshot_source::{CaptureConfig, MessageCapture};
use pulsar_types::ClusterTopology;
use snapshot_store::{FilesystemStore, SnapshotStore};

use crate::{AppConfig, ClusterOpts, SnapshotOpts};

/// A discovered topology together with the reconciled topic set it came from.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub topology: ClusterTopology,
    pub topics: TopicSet,
}

/// Totals of one capture run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub tenants: usize,
    pub namespaces: usize,
    pub topics: usize,
    pub captured_topics: usize,
    pub skipped_topics: usize,
    pub messages: usize,
    pub binary_messages: usize,
}

/// Walk tenants, then their namespaces, then reconcile every namespace's
/// topics.
///
/// Listing failures are logged and contribute nothing.
pub async fn discover_topology(directory: &dyn DirectoryClient) -> Discovery {
    let tenants = match directory.list_tenants().await {
        Ok(tenants) => tenants,
        Err(e) => {
            tracing::warn!("Failed to list tenants: {e}");
            Vec::new()
        }
    };

    let mut namespaces = Vec::new();
    for tenant in &tenants {
        match directory.list_namespaces(tenant).await {
            Ok(found) => namespaces.extend(found),
            Err(e) => tracing::warn!("Failed to list namespaces of tenant {tenant}: {e}"),
        }
    }

    let topics = TopicReconciler::new(directory)
        .reconcile_all(&namespaces)
        .await;

    Discovery {
        topology: ClusterTopology {
            tenants,
            namespaces,
            topics: topics.canonical(),
        },
        topics,
    }
}

/// Capture the cluster into `store`.
///
/// A topic whose reader cannot be opened is skipped, and any messages an
/// earlier capture stored for it are removed. Failing to write to the store
/// aborts the capture.
pub async fn capture_snapshot(
    directory: &dyn DirectoryClient,
    broker: &dyn Broker,
    store: &dyn SnapshotStore,
    config: CaptureConfig,
) -> anyhow::Result<CaptureSummary> {
    tracing::info!("Capturing tenants, namespaces and topics...");
    let Discovery { topology, topics } = discover_topology(directory).await;

    for violation in topology.validate() {
        tracing::warn!("Topology inconsistency: {violation}");
    }

    tracing::info!(
        "Found {} tenants, {} namespaces, {} topics ({} partitioned, {} names across all listings)",
        topology.tenants.len(),
        topology.namespaces.len(),
        topology.topics.len(),
        topics.partitioned.len(),
        topics.raw.len()
    );

    store
        .write_topology(&topology, &topics.raw)
        .await
        .context("Failed to write topology")?;

    let mut summary = CaptureSummary {
        tenants: topology.tenants.len(),
        namespaces: topology.namespaces.len(),
        topics: topology.topics.len(),
        ..Default::default()
    };

    tracing::info!("Capturing messages...");
    let capture = MessageCapture::new(broker, config);
    for topic in &topology.topics {
        tracing::info!("Capturing messages from {topic}...");
        let messages = match capture.capture(topic).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Skipping {topic}: {e:#}");
                summary.skipped_topics += 1;
                // A file left by an earlier capture would be replayed as if current
                if store
                    .remove_messages(topic)
                    .await
                    .with_context(|| format!("Failed to remove stale messages of {topic}"))?
                {
                    tracing::warn!("Removed messages of {topic} from an earlier capture");
                }
                continue;
            }
        };

        store
            .write_messages(&messages)
            .await
            .with_context(|| format!("Failed to write messages of {topic}"))?;

        tracing::info!(
            "  Captured {} messages from {topic} ({} binary)",
            messages.len(),
            messages.binary_count()
        );
        summary.captured_topics += 1;
        summary.messages += messages.len();
        summary.binary_messages += messages.binary_count();
    }

    Ok(summary)
}

pub async fn run(cluster: ClusterOpts, snapshot: SnapshotOpts) -> anyhow::Result<()> {
    let capture_config = snapshot.capture_config()?;
    let mut config = AppConfig::load(&cluster)?;
    config.authenticate().await;

    let directory = config.directory_client()?;
    super::check_connection(&directory).await?;
    let broker = config.connect_broker().await?;
    let store = FilesystemStore::new(&snapshot.snapshot_dir);

    let summary = capture_snapshot(&directory, &broker, &store, capture_config).await?;
    tracing::info!(
        "Capture completed: {} tenants, {} namespaces, {} topics ({} captured, {} skipped), {} messages into {}",
        summary.tenants,
        summary.namespaces,
        summary.topics,
        summary.captured_topics,
        summary.skipped_topics,
        summary.messages,
        snapshot.snapshot_dir.display()
    );
    Ok(())
}
