//! Runtime configuration.
//!
//! [`AppConfig`] is built once from the CLI/env options and an optional
//! pulsarctl context file, then handed to every command.

mod context;
mod duration;

pub use context::{AuthInfo, ContextEntry, ContextFile, ResolvedContext};
pub use duration::parse_duration;

use anyhow::Context;
use pulsar_admin::oauth::{acquire_token, OAuthSettings};
use pulsar_admin::HttpDirectoryClient;
use pulsar_client::PulsarBroker;
use std::time::Duration;

use crate::ClusterOpts;

pub const DEFAULT_ADMIN_URL: &str = "http://localhost:8080";

/// Resolved cluster connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub admin_url: String,
    pub service_url: String,
    pub token: Option<String>,
    pub oauth: Option<OAuthSettings>,
    pub request_timeout: Duration,
    /// Name of the context the settings came from, if any
    pub context: Option<String>,
}

impl AppConfig {
    /// Build the configuration, reading the context file when one is given.
    pub fn load(opts: &ClusterOpts) -> anyhow::Result<Self> {
        let context = match &opts.context_file {
            Some(path) => Some(ContextFile::from_file(path)?.resolve(opts.context.as_deref())?),
            None if opts.context.is_some() => {
                anyhow::bail!("--context requires --context-file")
            }
            None => None,
        };
        Self::resolve(opts, context)
    }

    /// Merge options with a resolved context. Explicit options win.
    pub fn resolve(opts: &ClusterOpts, context: Option<ResolvedContext>) -> anyhow::Result<Self> {
        let context = context.unwrap_or_default();

        let admin_url = opts
            .admin_url
            .clone()
            .or(context.admin_url)
            .unwrap_or_else(|| DEFAULT_ADMIN_URL.to_string());
        let service_url = match opts.service_url.clone().or(context.service_url) {
            Some(url) => url,
            None => derive_service_url(&admin_url)?,
        };

        Ok(Self {
            admin_url,
            service_url,
            token: opts.token.clone().filter(|t| !t.is_empty()),
            oauth: context.oauth,
            request_timeout: Duration::from_secs(opts.request_timeout_secs),
            context: (!context.name.is_empty()).then_some(context.name),
        })
    }

    /// Fetch an OAuth token unless one was given explicitly.
    ///
    /// Failures leave the configuration unauthenticated.
    pub async fn authenticate(&mut self) {
        if self.token.is_none() {
            if let Some(settings) = &self.oauth {
                self.token = acquire_token(settings, self.request_timeout).await;
            }
        }
        if self.token.is_none() {
            tracing::warn!("No authentication token (proceeding without auth)");
        }
    }

    pub fn directory_client(&self) -> anyhow::Result<HttpDirectoryClient> {
        HttpDirectoryClient::new(&self.admin_url, self.token.clone(), self.request_timeout)
            .with_context(|| format!("Failed to create admin client for {}", self.admin_url))
    }

    pub async fn connect_broker(&self) -> anyhow::Result<PulsarBroker> {
        tracing::info!("Connecting to Pulsar: {}", self.service_url);
        PulsarBroker::connect(&self.service_url, self.token.as_deref())
            .await
            .with_context(|| format!("Failed to connect to {}", self.service_url))
    }
}

/// Broker URL implied by an admin URL: `http` maps to `pulsar://host:6650`
/// and `https` to `pulsar+ssl://host:6651`.
pub fn derive_service_url(admin_url: &str) -> anyhow::Result<String> {
    let url = reqwest::Url::parse(admin_url)
        .with_context(|| format!("Invalid admin URL: {admin_url}"))?;
    let host = url
        .host_str()
        .with_context(|| format!("Admin URL has no host: {admin_url}"))?;
    match url.scheme() {
        "http" => Ok(format!("pulsar://{host}:6650")),
        "https" => Ok(format!("pulsar+ssl://{host}:6651")),
        other => anyhow::bail!("Unsupported admin URL scheme '{other}' in {admin_url}"),
    }
}
