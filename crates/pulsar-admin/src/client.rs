//! Directory client trait.

use async_trait::async_trait;

use crate::error::Result;

/// The three admin endpoints that enumerate topics of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicSource {
    /// `namespaces/{ns}/topics`
    Persistent,
    /// `persistent/{ns}/partitioned`
    Partitioned,
    /// `namespaces/{ns}/topics?includeSystemTopic=true`
    System,
}

impl TopicSource {
    pub const ALL: [TopicSource; 3] = [
        TopicSource::Persistent,
        TopicSource::Partitioned,
        TopicSource::System,
    ];

    /// Admin API path (relative to `admin/v2/`) listing this source.
    pub fn path(&self, namespace: &str) -> String {
        match self {
            TopicSource::Persistent => format!("namespaces/{namespace}/topics"),
            TopicSource::Partitioned => format!("persistent/{namespace}/partitioned"),
            TopicSource::System => {
                format!("namespaces/{namespace}/topics?includeSystemTopic=true")
            }
        }
    }
}

/// Result of an idempotent create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Control-plane operations against a cluster's admin API.
///
/// Listing calls return fully-qualified names as the broker reports them:
/// namespaces as `tenant/namespace`, topics as `persistent://tenant/ns/topic`.
/// Create calls treat "already exists" as success.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn list_clusters(&self) -> Result<Vec<String>>;

    async fn list_tenants(&self) -> Result<Vec<String>>;

    async fn list_namespaces(&self, tenant: &str) -> Result<Vec<String>>;

    async fn list_topics(&self, namespace: &str, source: TopicSource) -> Result<Vec<String>>;

    async fn create_tenant(&self, tenant: &str, allowed_clusters: &[String])
        -> Result<CreateOutcome>;

    async fn create_namespace(&self, namespace: &str) -> Result<CreateOutcome>;

    /// Create a non-partitioned topic.
    async fn create_topic(&self, topic: &str) -> Result<CreateOutcome>;

    /// Delete a topic. Partitioned topics are deleted with all their shards.
    async fn delete_topic(&self, topic: &str, partitioned: bool) -> Result<()>;

    async fn delete_namespace(&self, namespace: &str) -> Result<()>;

    async fn delete_tenant(&self, tenant: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_paths() {
        assert_eq!(
            TopicSource::Persistent.path("t/ns"),
            "namespaces/t/ns/topics"
        );
        assert_eq!(
            TopicSource::Partitioned.path("t/ns"),
            "persistent/t/ns/partitioned"
        );
        assert_eq!(
            TopicSource::System.path("t/ns"),
            "namespaces/t/ns/topics?includeSystemTopic=true"
        );
    }
}
