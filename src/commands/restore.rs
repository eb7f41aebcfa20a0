//! Restore: recreate a captured topology.

use anyhow::Context;
use pulsar_admin::DirectoryClient;
use pulsar_snapshot_sink::{RestoreReport, TopologyRestorer};
use snapshot_store::{FilesystemStore, SnapshotStore};

use crate::{AppConfig, ClusterOpts, SnapshotOpts, SystemResourceOpts};

pub async fn restore_snapshot(
    directory: &dyn DirectoryClient,
    store: &dyn SnapshotStore,
    allowed_clusters: Vec<String>,
) -> anyhow::Result<RestoreReport> {
    let topology = store
        .read_topology()
        .await
        .context("Failed to read the captured topology")?;
    Ok(TopologyRestorer::new(directory, allowed_clusters)
        .restore(&topology)
        .await)
}

pub async fn run(
    cluster: ClusterOpts,
    snapshot: SnapshotOpts,
    system: SystemResourceOpts,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load(&cluster)?;
    config.authenticate().await;

    let directory = config.directory_client()?;
    super::check_connection(&directory).await?;

    let store = FilesystemStore::new(&snapshot.snapshot_dir);
    let report = restore_snapshot(&directory, &store, system.allowed_clusters).await?;
    if report.failed() > 0 {
        tracing::warn!("{} entities could not be restored", report.failed());
    }
    Ok(())
}
