//! pulsarctl-style context files.
//!
//! ```yaml
//! current-context: prod
//! contexts:
//!   prod:
//!     admin-service-url: https://pulsar.example.com:8443
//!     broker-service-url: pulsar+ssl://pulsar.example.com:6651
//! auth-info:
//!   prod:
//!     issuer_endpoint: https://auth.example.com
//!     client_id: my-client
//!     audience: urn:sn:pulsar:org:instance
//!     key_file: /home/me/.config/pulsar/key.json
//! ```

use anyhow::Context;
use pulsar_admin::oauth::OAuthSettings;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContextFile {
    pub current_context: Option<String>,
    #[serde(default)]
    pub contexts: HashMap<String, ContextEntry>,
    #[serde(default)]
    pub auth_info: HashMap<String, AuthInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContextEntry {
    pub admin_service_url: Option<String>,
    pub broker_service_url: Option<String>,
    pub bookie_service_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthInfo {
    pub issuer_endpoint: Option<String>,
    pub client_id: Option<String>,
    pub audience: Option<String>,
    pub key_file: Option<PathBuf>,
}

/// The parts of one context the tool uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedContext {
    pub name: String,
    pub admin_url: Option<String>,
    pub service_url: Option<String>,
    pub oauth: Option<OAuthSettings>,
}

impl ContextFile {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Resolve `name`, or the file's current context when `name` is None.
    pub fn resolve(&self, name: Option<&str>) -> anyhow::Result<ResolvedContext> {
        let name = name
            .map(str::to_string)
            .or_else(|| self.current_context.clone())
            .context("No current context set in config")?;
        let entry = self
            .contexts
            .get(&name)
            .with_context(|| format!("Context '{name}' not found in config"))?;

        // A context without an issuer runs unauthenticated
        let oauth = self.auth_info.get(&name).and_then(|auth| {
            let issuer_endpoint = auth.issuer_endpoint.clone()?;
            Some(OAuthSettings {
                issuer_endpoint,
                client_id: auth.client_id.clone(),
                audience: auth.audience.clone(),
                key_file: auth.key_file.clone(),
            })
        });

        Ok(ResolvedContext {
            name,
            admin_url: entry.admin_service_url.clone(),
            service_url: entry
                .broker_service_url
                .clone()
                .or_else(|| entry.bookie_service_url.clone()),
            oauth,
        })
    }
}
