//! reqwest-backed [`DirectoryClient`].

use async_trait::async_trait;
use pulsar_types::TopicName;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;

use crate::client::{CreateOutcome, DirectoryClient, TopicSource};
use crate::error::{AdminError, Result};

/// Body of `PUT tenants/{tenant}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TenantInfo<'a> {
    admin_roles: Vec<String>,
    allowed_clusters: &'a [String],
}

/// Admin API client speaking HTTP to `{admin_url}/admin/v2/...`.
///
/// When a token is set, every request carries `Authorization: Bearer <token>`.
pub struct HttpDirectoryClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDirectoryClient {
    pub fn new(admin_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdminError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: admin_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn admin_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/admin/v2/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = self.url(path);
        tracing::debug!("{method} {url}");

        let mut builder = self.request(method.clone(), &url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| AdminError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AdminError::Status {
            method: method.to_string(),
            url,
            status: status.as_u16(),
            body,
        })
    }

    async fn get_names(&self, path: &str) -> Result<Vec<String>> {
        let response = self.execute(Method::GET, path, None).await?;
        let url = response.url().to_string();
        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| AdminError::Decode {
                url,
                reason: e.to_string(),
            })
    }

    async fn create(&self, path: &str, body: Option<serde_json::Value>) -> Result<CreateOutcome> {
        match self.execute(Method::PUT, path, body).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if e.is_conflict() => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.execute(Method::DELETE, path, None).await?;
        Ok(())
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn list_clusters(&self) -> Result<Vec<String>> {
        self.get_names("clusters").await
    }

    async fn list_tenants(&self) -> Result<Vec<String>> {
        self.get_names("tenants").await
    }

    async fn list_namespaces(&self, tenant: &str) -> Result<Vec<String>> {
        self.get_names(&format!("namespaces/{tenant}")).await
    }

    async fn list_topics(&self, namespace: &str, source: TopicSource) -> Result<Vec<String>> {
        self.get_names(&source.path(namespace)).await
    }

    async fn create_tenant(
        &self,
        tenant: &str,
        allowed_clusters: &[String],
    ) -> Result<CreateOutcome> {
        let info = TenantInfo {
            admin_roles: Vec::new(),
            allowed_clusters,
        };
        let body = serde_json::to_value(&info).map_err(|e| AdminError::Decode {
            url: self.url(&format!("tenants/{tenant}")),
            reason: e.to_string(),
        })?;
        self.create(&format!("tenants/{tenant}"), Some(body)).await
    }

    async fn create_namespace(&self, namespace: &str) -> Result<CreateOutcome> {
        self.create(&format!("namespaces/{namespace}"), None).await
    }

    async fn create_topic(&self, topic: &str) -> Result<CreateOutcome> {
        let name = TopicName::parse(topic)?;
        self.create(&name.admin_path(), None).await
    }

    async fn delete_topic(&self, topic: &str, partitioned: bool) -> Result<()> {
        let name = TopicName::parse(topic)?;
        let path = if partitioned {
            format!("{}/partitions", name.admin_path())
        } else {
            name.admin_path()
        };
        self.delete(&path).await
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        self.delete(&format!("namespaces/{namespace}")).await
    }

    async fn delete_tenant(&self, tenant: &str) -> Result<()> {
        self.delete(&format!("tenants/{tenant}")).await
    }
}
