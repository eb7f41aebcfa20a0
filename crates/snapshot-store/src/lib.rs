//! Snapshot storage.
//!
//! A snapshot directory holds the cluster topology as newline-separated text
//! files and one JSON file per captured topic:
//!
//! ```text
//! <dir>/tenants.txt
//! <dir>/namespaces.txt
//! <dir>/topics.txt          canonical topics
//! <dir>/all_topics.txt      raw union of every listing
//! <dir>/messages/<topic with '/' replaced by '_'>.json
//! ```

mod filesystem;

pub use filesystem::FilesystemStore;

use anyhow::Result;
use async_trait::async_trait;
use pulsar_types::{ClusterTopology, TopicMessageSet};

/// Trait for snapshot storage operations.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Store the topology and the raw topic listing.
    async fn write_topology(&self, topology: &ClusterTopology, all_topics: &[String])
        -> Result<()>;

    async fn read_topology(&self) -> Result<ClusterTopology>;

    /// Store the captured messages of one topic, replacing earlier ones.
    async fn write_messages(&self, messages: &TopicMessageSet) -> Result<()>;

    /// Read the captured messages of one topic.
    ///
    /// Returns None if nothing was captured for the topic.
    async fn read_messages(&self, topic: &str) -> Result<Option<TopicMessageSet>>;

    /// Drop the captured messages of one topic.
    ///
    /// Returns whether anything was removed.
    async fn remove_messages(&self, topic: &str) -> Result<bool>;
}
