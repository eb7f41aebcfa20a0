//! Filesystem-based snapshot storage implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use pulsar_types::{snapshot_file_stem, ClusterTopology, MessageRecord, TopicMessageSet};
use std::path::{Path, PathBuf};

use crate::SnapshotStore;

const TENANTS_FILE: &str = "tenants.txt";
const NAMESPACES_FILE: &str = "namespaces.txt";
const TOPICS_FILE: &str = "topics.txt";
const ALL_TOPICS_FILE: &str = "all_topics.txt";
const MESSAGES_DIR: &str = "messages";

/// Filesystem implementation of SnapshotStore trait.
pub struct FilesystemStore {
    dir: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore with the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the directory path.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Path of the message file for a topic.
    pub fn messages_path(&self, topic: &str) -> PathBuf {
        self.dir
            .join(MESSAGES_DIR)
            .join(format!("{}.json", snapshot_file_stem(topic)))
    }

    /// Raw topic listing saved next to the topology.
    pub fn read_all_topics(&self) -> Result<Vec<String>> {
        read_list(&self.dir.join(ALL_TOPICS_FILE))
    }
}

fn write_list(path: &Path, items: &[String]) -> Result<()> {
    std::fs::write(path, items.join("\n"))
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn read_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl SnapshotStore for FilesystemStore {
    async fn write_topology(
        &self,
        topology: &ClusterTopology,
        all_topics: &[String],
    ) -> Result<()> {
        std::fs::create_dir_all(self.dir.join(MESSAGES_DIR))
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        write_list(&self.dir.join(TENANTS_FILE), &topology.tenants)?;
        write_list(&self.dir.join(NAMESPACES_FILE), &topology.namespaces)?;
        write_list(&self.dir.join(TOPICS_FILE), &topology.topics)?;
        write_list(&self.dir.join(ALL_TOPICS_FILE), all_topics)?;

        tracing::info!(
            "Stored topology to {} ({} tenants, {} namespaces, {} topics)",
            self.dir.display(),
            topology.tenants.len(),
            topology.namespaces.len(),
            topology.topics.len()
        );
        Ok(())
    }

    async fn read_topology(&self) -> Result<ClusterTopology> {
        Ok(ClusterTopology {
            tenants: read_list(&self.dir.join(TENANTS_FILE))?,
            namespaces: read_list(&self.dir.join(NAMESPACES_FILE))?,
            topics: read_list(&self.dir.join(TOPICS_FILE))?,
        })
    }

    async fn write_messages(&self, messages: &TopicMessageSet) -> Result<()> {
        let path = self.messages_path(&messages.topic);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let records = messages.to_records();
        std::fs::write(&path, serde_json::to_string_pretty(&records)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(
            "Stored {} messages for {} to {}",
            records.len(),
            messages.topic,
            path.display()
        );
        Ok(())
    }

    async fn read_messages(&self, topic: &str) -> Result<Option<TopicMessageSet>> {
        let path = self.messages_path(topic);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let records: Vec<MessageRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid message file {}", path.display()))?;

        let set = TopicMessageSet::from_records(topic, records)
            .with_context(|| format!("Invalid message content in {}", path.display()))?;
        Ok(Some(set))
    }

    async fn remove_messages(&self, topic: &str) -> Result<bool> {
        let path = self.messages_path(topic);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}
