//! Inspect: list the tenants, namespaces and topics of a cluster.

use clap::ValueEnum;
use pulsar_admin::{DirectoryClient, TopicReconciler, TopicSet};
use std::io::{self, Write};

use crate::{AppConfig, ClusterOpts};

/// Namespaces whose names contain one of these are listed first when the
/// topic listing is limited.
pub const PRIORITY_PATTERNS: [&str; 3] = ["org-1", "global", "dlq"];

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InspectTarget {
    Tenants,
    Namespaces,
    Topics,
    /// Tenants, namespaces and topics
    #[default]
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectOptions {
    pub target: InspectTarget,
    pub tenant: Option<String>,
    /// Namespace within `tenant`, without the tenant prefix
    pub namespace: Option<String>,
    pub topics_limit: usize,
}

fn is_priority(namespace: &str) -> bool {
    PRIORITY_PATTERNS.iter().any(|p| namespace.contains(p))
}

/// Stable reorder putting priority namespaces first.
pub fn prioritize(namespaces: Vec<String>) -> Vec<String> {
    let (mut first, rest): (Vec<_>, Vec<_>) =
        namespaces.into_iter().partition(|ns| is_priority(ns));
    first.extend(rest);
    first
}

fn write_items(out: &mut impl Write, items: &[String]) -> io::Result<()> {
    for item in items {
        writeln!(out, "  • {item}")?;
    }
    Ok(())
}

pub async fn list_tenants(
    directory: &dyn DirectoryClient,
    out: &mut impl Write,
) -> io::Result<Vec<String>> {
    writeln!(out, "\n=== TENANTS ===")?;
    let tenants = match directory.list_tenants().await {
        Ok(tenants) => tenants,
        Err(e) => {
            tracing::warn!("Failed to fetch tenants: {e}");
            writeln!(out, "Failed to fetch tenants")?;
            return Ok(Vec::new());
        }
    };
    write_items(out, &tenants)?;
    writeln!(out, "Total: {} tenants", tenants.len())?;
    Ok(tenants)
}

/// Namespaces of one tenant, or of every tenant.
pub async fn list_namespaces(
    directory: &dyn DirectoryClient,
    tenant: Option<&str>,
    out: &mut impl Write,
) -> io::Result<Vec<String>> {
    match tenant {
        Some(tenant) => writeln!(out, "\n=== NAMESPACES ({tenant}) ===")?,
        None => writeln!(out, "\n=== NAMESPACES ===")?,
    }

    let tenants = match tenant {
        Some(tenant) => vec![tenant.to_string()],
        None => directory.list_tenants().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch tenants: {e}");
            Vec::new()
        }),
    };

    let mut namespaces = Vec::new();
    for tenant in &tenants {
        match directory.list_namespaces(tenant).await {
            Ok(found) => namespaces.extend(found),
            Err(e) => {
                tracing::warn!("Failed to fetch namespaces for tenant {tenant}: {e}");
                writeln!(out, "Failed to fetch namespaces for tenant: {tenant}")?;
            }
        }
    }

    write_items(out, &namespaces)?;
    writeln!(out, "Total: {} namespaces", namespaces.len())?;
    Ok(namespaces)
}

/// Every topic of one namespace, partitioned topics first.
pub async fn list_namespace_topics(
    directory: &dyn DirectoryClient,
    namespace: &str,
    out: &mut impl Write,
) -> io::Result<TopicSet> {
    writeln!(out, "\n=== TOPICS ({namespace}) ===")?;
    let set = TopicReconciler::new(directory).reconcile(namespace).await;
    if set.raw.is_empty() {
        writeln!(out, "No topics found for namespace: {namespace}")?;
        return Ok(set);
    }
    writeln!(out, "Found {} total topics", set.raw.len())?;

    writeln!(out, "\n=== PARTITIONED TOPICS ===")?;
    for topic in &set.partitioned {
        writeln!(out, "  • {topic} (partitioned)")?;
    }
    writeln!(out, "\n=== NON-PARTITIONED TOPICS ===")?;
    write_items(out, &set.non_partitioned)?;

    writeln!(
        out,
        "\nTotal: {} topics ({} partitioned, {} non-partitioned)",
        set.len(),
        set.partitioned.len(),
        set.non_partitioned.len()
    )?;
    Ok(set)
}

/// Up to `limit` topics of one tenant or the whole cluster, scanning
/// priority namespaces first.
pub async fn list_topics_limited(
    directory: &dyn DirectoryClient,
    tenant: Option<&str>,
    limit: usize,
    out: &mut impl Write,
) -> io::Result<Vec<String>> {
    match tenant {
        Some(tenant) => writeln!(out, "\n=== TOPICS (tenant {tenant}) ===")?,
        None => writeln!(out, "\n=== TOPICS (first {limit}) ===")?,
    }

    let tenants = match tenant {
        Some(tenant) => vec![tenant.to_string()],
        None => directory.list_tenants().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch tenants: {e}");
            Vec::new()
        }),
    };

    let mut namespaces = Vec::new();
    for tenant in &tenants {
        match directory.list_namespaces(tenant).await {
            Ok(found) => namespaces.extend(found),
            Err(e) => tracing::debug!("Skipping tenant {tenant}: {e}"),
        }
    }

    let reconciler = TopicReconciler::new(directory);
    let mut topics = Vec::new();
    for namespace in prioritize(namespaces) {
        if topics.len() >= limit {
            break;
        }
        tracing::debug!("Checking {namespace}...");
        let set = reconciler.reconcile(&namespace).await;
        let room = limit - topics.len();
        topics.extend(set.canonical().into_iter().take(room));
    }

    write_items(out, &topics)?;
    writeln!(out, "Total: {} topics", topics.len())?;
    Ok(topics)
}

/// Run one inspection.
pub async fn inspect(
    directory: &dyn DirectoryClient,
    options: &InspectOptions,
    out: &mut impl Write,
) -> io::Result<()> {
    let tenant = options.tenant.as_deref();
    let full_namespace = match (tenant, options.namespace.as_deref()) {
        (Some(tenant), Some(namespace)) => Some(format!("{tenant}/{namespace}")),
        _ => None,
    };

    match options.target {
        InspectTarget::Tenants => {
            list_tenants(directory, out).await?;
        }
        InspectTarget::Namespaces => {
            list_namespaces(directory, tenant, out).await?;
        }
        InspectTarget::Topics => match &full_namespace {
            Some(namespace) => {
                list_namespace_topics(directory, namespace, out).await?;
            }
            None => {
                list_topics_limited(directory, tenant, options.topics_limit, out).await?;
            }
        },
        InspectTarget::All => {
            let tenants = list_tenants(directory, out).await?;
            match tenant {
                Some(tenant) if tenants.iter().any(|t| t == tenant) => {
                    let namespaces = list_namespaces(directory, Some(tenant), out).await?;
                    if let Some(namespace) = &full_namespace {
                        if namespaces.contains(namespace) {
                            list_namespace_topics(directory, namespace, out).await?;
                        }
                    }
                }
                _ => {
                    list_namespaces(directory, None, out).await?;
                    list_topics_limited(directory, tenant, options.topics_limit, out).await?;
                }
            }
        }
    }
    Ok(())
}

pub async fn run(cluster: ClusterOpts, options: InspectOptions) -> anyhow::Result<()> {
    if options.namespace.is_some() && options.tenant.is_none() {
        anyhow::bail!("--namespace requires --tenant");
    }

    let mut config = AppConfig::load(&cluster)?;
    match &config.context {
        Some(context) => tracing::info!("Connecting to Pulsar context: {context}"),
        None => tracing::info!("Connecting to Pulsar"),
    }
    tracing::info!("Admin URL: {}", config.admin_url);
    config.authenticate().await;

    let directory = config.directory_client()?;
    super::check_connection(&directory).await?;

    inspect(&directory, &options, &mut io::stdout()).await?;
    Ok(())
}
