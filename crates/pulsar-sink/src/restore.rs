use pulsar_admin::{CreateOutcome, DirectoryClient, Result as AdminResult};
use pulsar_types::ClusterTopology;
use std::fmt;

/// Create results for one kind of entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
}

impl EntityCounts {
    fn record(&mut self, kind: &str, name: &str, result: AdminResult<CreateOutcome>) {
        match result {
            Ok(CreateOutcome::Created) => {
                tracing::info!("Created {kind}: {name}");
                self.created += 1;
            }
            Ok(CreateOutcome::AlreadyExists) => {
                tracing::info!("{kind} already exists: {name}");
                self.existing += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to create {kind} {name}: {e}");
                self.failed += 1;
            }
        }
    }
}

impl fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} existing, {} failed",
            self.created, self.existing, self.failed
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub tenants: EntityCounts,
    pub namespaces: EntityCounts,
    pub topics: EntityCounts,
}

impl RestoreReport {
    pub fn failed(&self) -> usize {
        self.tenants.failed + self.namespaces.failed + self.topics.failed
    }
}

/// Recreates a captured topology: tenants, then namespaces, then topics.
///
/// Every entity is attempted even if earlier ones failed.
pub struct TopologyRestorer<'a> {
    directory: &'a dyn DirectoryClient,
    allowed_clusters: Vec<String>,
}

impl<'a> TopologyRestorer<'a> {
    pub fn new(directory: &'a dyn DirectoryClient, allowed_clusters: Vec<String>) -> Self {
        Self {
            directory,
            allowed_clusters,
        }
    }

    pub async fn restore(&self, topology: &ClusterTopology) -> RestoreReport {
        let mut report = RestoreReport::default();

        tracing::info!("Recreating {} tenants", topology.tenants.len());
        for tenant in &topology.tenants {
            let result = self
                .directory
                .create_tenant(tenant, &self.allowed_clusters)
                .await;
            report.tenants.record("tenant", tenant, result);
        }

        tracing::info!("Recreating {} namespaces", topology.namespaces.len());
        for namespace in &topology.namespaces {
            let result = self.directory.create_namespace(namespace).await;
            report.namespaces.record("namespace", namespace, result);
        }

        tracing::info!("Recreating {} topics", topology.topics.len());
        for topic in &topology.topics {
            let result = self.directory.create_topic(topic).await;
            report.topics.record("topic", topic, result);
        }

        tracing::info!(
            "Restore completed. Tenants: {}. Namespaces: {}. Topics: {}.",
            report.tenants,
            report.namespaces,
            report.topics
        );
        report
    }
}
