//! Delete-all: remove every non-system topic, namespace and tenant.

use pulsar_admin::{DirectoryClient, TopicReconciler, TopicSet};
use std::fmt;
use std::io::{BufRead, Write};

use crate::{AppConfig, ClusterOpts, SystemResourceOpts};

/// Text the user must type to confirm.
pub const CONFIRMATION: &str = "DELETE";

const PROMPT: &str =
    "WARNING: This will delete ALL topics, namespaces, and tenants from Pulsar.\nType 'DELETE' to confirm: ";

/// Prompt on `output` and read one line from `input`.
///
/// Only the exact confirmation text confirms; surrounding whitespace is not
/// forgiven beyond the line terminator.
pub fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> std::io::Result<bool> {
    output.write_all(PROMPT.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']) == CONFIRMATION)
}

/// What a delete-all run will remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    pub tenants: Vec<String>,
    pub namespaces: Vec<String>,
    pub topics: TopicSet,
}

/// Find the non-system tenants, their non-system namespaces and every topic
/// in those namespaces.
pub async fn plan_deletion(
    directory: &dyn DirectoryClient,
    system: &SystemResourceOpts,
) -> DeletionPlan {
    let tenants: Vec<String> = match directory.list_tenants().await {
        Ok(tenants) => tenants
            .into_iter()
            .filter(|t| !system.is_system_tenant(t))
            .collect(),
        Err(e) => {
            tracing::warn!("No tenants found or could not list tenants: {e}");
            Vec::new()
        }
    };

    let mut namespaces = Vec::new();
    for tenant in &tenants {
        match directory.list_namespaces(tenant).await {
            Ok(found) => namespaces.extend(
                found
                    .into_iter()
                    .filter(|ns| !system.is_system_namespace(ns)),
            ),
            Err(e) => tracing::warn!("Failed to list namespaces of tenant {tenant}: {e}"),
        }
    }

    let topics = TopicReconciler::new(directory)
        .reconcile_all(&namespaces)
        .await;

    DeletionPlan {
        tenants,
        namespaces,
        topics,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteCounts {
    pub deleted: usize,
    pub failed: usize,
}

impl fmt::Display for DeleteCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} deleted, {} failed", self.deleted, self.failed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub topics: DeleteCounts,
    pub namespaces: DeleteCounts,
    pub tenants: DeleteCounts,
}

impl DeleteCounts {
    fn record(&mut self, kind: &str, name: &str, result: pulsar_admin::Result<()>) {
        match result {
            Ok(()) => self.deleted += 1,
            Err(e) if e.is_not_found() => {
                tracing::debug!("{kind} {name} is already gone");
                self.deleted += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to delete {kind} {name}: {e}");
                self.failed += 1;
            }
        }
    }
}

/// Delete topics, then namespaces, then tenants. Every entity is attempted.
pub async fn delete_all(directory: &dyn DirectoryClient, plan: &DeletionPlan) -> DeleteReport {
    let mut report = DeleteReport::default();

    tracing::info!("Deleting {} topics...", plan.topics.len());
    for topic in plan.topics.canonical() {
        let partitioned = plan.topics.is_partitioned(&topic);
        tracing::info!("  Deleting topic: {topic}");
        let result = directory.delete_topic(&topic, partitioned).await;
        report.topics.record("topic", &topic, result);
    }

    tracing::info!("Deleting {} namespaces...", plan.namespaces.len());
    for namespace in &plan.namespaces {
        tracing::info!("  Deleting namespace: {namespace}");
        let result = directory.delete_namespace(namespace).await;
        report.namespaces.record("namespace", namespace, result);
    }

    tracing::info!("Deleting {} tenants...", plan.tenants.len());
    for tenant in &plan.tenants {
        tracing::info!("  Deleting tenant: {tenant}");
        let result = directory.delete_tenant(tenant).await;
        report.tenants.record("tenant", tenant, result);
    }

    report
}

pub async fn run(cluster: ClusterOpts, system: SystemResourceOpts, yes: bool) -> anyhow::Result<()> {
    if !yes {
        let stdin = std::io::stdin();
        let confirmed = confirm(&mut stdin.lock(), &mut std::io::stdout())?;
        if !confirmed {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let mut config = AppConfig::load(&cluster)?;
    config.authenticate().await;
    let directory = config.directory_client()?;
    super::check_connection(&directory).await?;

    tracing::info!("Finding resources to delete...");
    let plan = plan_deletion(&directory, &system).await;
    tracing::info!(
        "Found {} non-system tenants ({}), {} non-system namespaces, {} topics",
        plan.tenants.len(),
        plan.tenants.join(", "),
        plan.namespaces.len(),
        plan.topics.len()
    );

    let report = delete_all(&directory, &plan).await;
    tracing::info!(
        "Deletion completed. Topics: {}. Namespaces: {}. Tenants: {}. System tenants and namespaces were preserved.",
        report.topics,
        report.namespaces,
        report.tenants
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(text: &str) -> (bool, String) {
        let mut output = Vec::new();
        let confirmed = confirm(&mut Cursor::new(text.as_bytes()), &mut output).unwrap();
        (confirmed, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_confirm_requires_exact_text() {
        let (confirmed, prompt) = answer("DELETE\n");
        assert!(confirmed);
        assert!(prompt.ends_with("Type 'DELETE' to confirm: "));

        assert!(answer("DELETE\r\n").0);
        assert!(answer("DELETE").0);
        assert!(!answer("delete\n").0);
        assert!(!answer(" DELETE\n").0);
        assert!(!answer("yes\n").0);
        assert!(!answer("").0);
    }
}
