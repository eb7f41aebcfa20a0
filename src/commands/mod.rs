//! Command handlers.
//!
//! Each submodule implements one CLI command against the [`DirectoryClient`],
//! [`pulsar_client::Broker`] and [`snapshot_store::SnapshotStore`] seams so the
//! same code runs against a live cluster and the in-memory test doubles.
//!
//! - `capture`: topology discovery and bounded message capture
//! - `restore`: recreate tenants, namespaces and topics from a snapshot
//! - `replay`: republish captured messages
//! - `delete`: delete every non-system topic, namespace and tenant
//! - `print`: dump the messages of every topic
//! - `inspect`: list tenants, namespaces and topics
//! - `publish`: synthetic event publisher
//! - `generate`: `sample` and `ranges` of the event generator

pub mod capture;
pub mod delete;
pub mod generate;
pub mod inspect;
pub mod print;
pub mod publish;
pub mod replay;
pub mod restore;

use anyhow::Context;
use pulsar_admin::DirectoryClient;

pub use capture::{discover_topology, Discovery};

/// Check the admin API answers, returning the cluster names.
pub async fn check_connection(directory: &dyn DirectoryClient) -> anyhow::Result<Vec<String>> {
    let clusters = directory
        .list_clusters()
        .await
        .context("Pulsar is not running or not accessible")?;
    tracing::info!("Connection successful (clusters: {})", clusters.join(", "));
    Ok(clusters)
}
