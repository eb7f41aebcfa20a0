//! In-process [`DirectoryClient`] used by tests and dry runs.

use async_trait::async_trait;
use pulsar_types::TopicName;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::client::{CreateOutcome, DirectoryClient, TopicSource};
use crate::error::{AdminError, Result};

#[derive(Debug, Default)]
struct DirectoryState {
    clusters: Vec<String>,
    tenants: Vec<String>,
    namespaces: Vec<String>,
    listings: HashMap<(String, TopicSource), Vec<String>>,
    listing_failures: HashMap<(String, TopicSource), u16>,
    failing_names: HashSet<String>,
    created_topics: Vec<String>,
    deleted_topics: Vec<(String, bool)>,
    deleted_namespaces: Vec<String>,
    deleted_tenants: Vec<String>,
}

/// A directory held in memory.
///
/// Listings are returned exactly as configured, so overlapping sources can be
/// modelled. Creating a topic adds it to the namespace's plain listing.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: Mutex<DirectoryState>,
}

fn status_error(method: &str, path: String, status: u16) -> AdminError {
    AdminError::Status {
        method: method.to_string(),
        url: format!("memory://admin/v2/{path}"),
        status,
        body: String::new(),
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_cluster(self, cluster: &str) -> Self {
        self.state().clusters.push(cluster.to_string());
        self
    }

    pub fn with_tenant(self, tenant: &str) -> Self {
        self.state().tenants.push(tenant.to_string());
        self
    }

    pub fn with_namespace(self, namespace: &str) -> Self {
        self.state().namespaces.push(namespace.to_string());
        self
    }

    pub fn with_listing(self, namespace: &str, source: TopicSource, topics: &[&str]) -> Self {
        self.state()
            .listings
            .entry((namespace.to_string(), source))
            .or_default()
            .extend(topics.iter().map(|t| t.to_string()));
        self
    }

    /// Make one listing answer with the given HTTP status.
    pub fn fail_listing(self, namespace: &str, source: TopicSource, status: u16) -> Self {
        self.state()
            .listing_failures
            .insert((namespace.to_string(), source), status);
        self
    }

    /// Make every create or delete call for this name answer with status 500.
    pub fn fail_name(self, name: &str) -> Self {
        self.state().failing_names.insert(name.to_string());
        self
    }

    pub fn tenants(&self) -> Vec<String> {
        self.state().tenants.clone()
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.state().namespaces.clone()
    }

    pub fn created_topics(&self) -> Vec<String> {
        self.state().created_topics.clone()
    }

    /// Deleted topics with their partitioned flag, in call order.
    pub fn deleted_topics(&self) -> Vec<(String, bool)> {
        self.state().deleted_topics.clone()
    }

    pub fn deleted_namespaces(&self) -> Vec<String> {
        self.state().deleted_namespaces.clone()
    }

    pub fn deleted_tenants(&self) -> Vec<String> {
        self.state().deleted_tenants.clone()
    }

    fn check_failing(&self, method: &str, path: String, name: &str) -> Result<()> {
        if self.state().failing_names.contains(name) {
            return Err(status_error(method, path, 500));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn list_clusters(&self) -> Result<Vec<String>> {
        Ok(self.state().clusters.clone())
    }

    async fn list_tenants(&self) -> Result<Vec<String>> {
        Ok(self.state().tenants.clone())
    }

    async fn list_namespaces(&self, tenant: &str) -> Result<Vec<String>> {
        let state = self.state();
        if !state.tenants.iter().any(|t| t == tenant) {
            return Err(status_error("GET", format!("namespaces/{tenant}"), 404));
        }
        let prefix = format!("{tenant}/");
        Ok(state
            .namespaces
            .iter()
            .filter(|ns| ns.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn list_topics(&self, namespace: &str, source: TopicSource) -> Result<Vec<String>> {
        let state = self.state();
        let key = (namespace.to_string(), source);
        if let Some(status) = state.listing_failures.get(&key) {
            return Err(status_error("GET", source.path(namespace), *status));
        }
        Ok(state.listings.get(&key).cloned().unwrap_or_default())
    }

    async fn create_tenant(
        &self,
        tenant: &str,
        _allowed_clusters: &[String],
    ) -> Result<CreateOutcome> {
        self.check_failing("PUT", format!("tenants/{tenant}"), tenant)?;
        let mut state = self.state();
        if state.tenants.iter().any(|t| t == tenant) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.tenants.push(tenant.to_string());
        Ok(CreateOutcome::Created)
    }

    async fn create_namespace(&self, namespace: &str) -> Result<CreateOutcome> {
        self.check_failing("PUT", format!("namespaces/{namespace}"), namespace)?;
        let mut state = self.state();
        let tenant = namespace.split('/').next().unwrap_or_default();
        if !state.tenants.iter().any(|t| t == tenant) {
            return Err(status_error("PUT", format!("namespaces/{namespace}"), 404));
        }
        if state.namespaces.iter().any(|ns| ns == namespace) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.namespaces.push(namespace.to_string());
        Ok(CreateOutcome::Created)
    }

    async fn create_topic(&self, topic: &str) -> Result<CreateOutcome> {
        let name = TopicName::parse(topic)?;
        self.check_failing("PUT", name.admin_path(), topic)?;

        let mut state = self.state();
        let namespace = name.namespace_path();
        if !state.namespaces.contains(&namespace) {
            return Err(status_error("PUT", name.admin_path(), 404));
        }

        let listing = state
            .listings
            .entry((namespace, TopicSource::Persistent))
            .or_default();
        let canonical = name.to_string();
        if listing.contains(&canonical) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        listing.push(canonical.clone());
        state.created_topics.push(canonical);
        Ok(CreateOutcome::Created)
    }

    async fn delete_topic(&self, topic: &str, partitioned: bool) -> Result<()> {
        let name = TopicName::parse(topic)?;
        self.check_failing("DELETE", name.admin_path(), topic)?;

        let mut state = self.state();
        for listing in state.listings.values_mut() {
            listing.retain(|t| {
                t != topic && pulsar_types::partition_parent(t) != Some(topic)
            });
        }
        state.deleted_topics.push((topic.to_string(), partitioned));
        Ok(())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        self.check_failing("DELETE", format!("namespaces/{namespace}"), namespace)?;
        let mut state = self.state();
        state.namespaces.retain(|ns| ns != namespace);
        state.deleted_namespaces.push(namespace.to_string());
        Ok(())
    }

    async fn delete_tenant(&self, tenant: &str) -> Result<()> {
        self.check_failing("DELETE", format!("tenants/{tenant}"), tenant)?;
        let mut state = self.state();
        state.tenants.retain(|t| t != tenant);
        state.deleted_tenants.push(tenant.to_string());
        Ok(())
    }
}
