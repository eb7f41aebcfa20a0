//! OAuth2 client-credentials token acquisition.
//!
//! The key file is a service-account JSON document carrying `client_id` and
//! `client_secret`. The token is requested from `<issuer>/oauth/token`.

use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AdminError, Result};

/// Where and how to request a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthSettings {
    pub issuer_endpoint: String,
    /// Fallback client id when the key file does not carry one
    pub client_id: Option<String>,
    pub audience: Option<String>,
    pub key_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ServiceAccount {
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

pub fn token_url(issuer_endpoint: &str) -> String {
    format!("{}/oauth/token", issuer_endpoint.trim_end_matches('/'))
}

/// Build the form fields of the token request from the settings and key file.
pub fn token_request_form(settings: &OAuthSettings) -> Result<Vec<(&'static str, String)>> {
    let key_file = settings
        .key_file
        .as_ref()
        .ok_or_else(|| AdminError::OAuth("no key file configured".to_string()))?;

    if !key_file.exists() {
        return Err(AdminError::OAuth(format!(
            "key file not found at {}",
            key_file.display()
        )));
    }

    let content = std::fs::read_to_string(key_file).map_err(|e| {
        AdminError::OAuth(format!("failed to read key file {}: {e}", key_file.display()))
    })?;
    let account: ServiceAccount = serde_json::from_str(content.trim())
        .map_err(|e| AdminError::OAuth(format!("failed to parse service account file: {e}")))?;

    let client_id = account
        .client_id
        .or_else(|| settings.client_id.clone())
        .ok_or_else(|| AdminError::OAuth("no client_id in key file or context".to_string()))?;
    let client_secret = account
        .client_secret
        .ok_or_else(|| AdminError::OAuth("no client_secret in key file".to_string()))?;

    let mut form = vec![
        ("grant_type", "client_credentials".to_string()),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];
    if let Some(audience) = &settings.audience {
        form.push(("audience", audience.clone()));
    }
    Ok(form)
}

/// Request an access token with the client-credentials grant.
pub async fn fetch_token(settings: &OAuthSettings, timeout: Duration) -> Result<String> {
    let form = token_request_form(settings)?;
    let url = token_url(&settings.issuer_endpoint);

    let http = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AdminError::Config(format!("failed to build HTTP client: {e}")))?;

    tracing::debug!("Requesting OAuth token from {url}");

    let response = http
        .post(&url)
        .form(&form)
        .send()
        .await
        .map_err(|source| AdminError::Transport {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdminError::Status {
            method: "POST".to_string(),
            url,
            status: status.as_u16(),
            body,
        });
    }

    let token: TokenResponse = response.json().await.map_err(|e| AdminError::Decode {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    token
        .access_token
        .ok_or_else(|| AdminError::OAuth(format!("no access_token in response from {url}")))
}

/// Acquire a token, degrading to unauthenticated access on any failure.
pub async fn acquire_token(settings: &OAuthSettings, timeout: Duration) -> Option<String> {
    match fetch_token(settings, timeout).await {
        Ok(token) => {
            tracing::info!("Authentication successful");
            Some(token)
        }
        Err(e) => {
            tracing::warn!("Failed to get OAuth token, proceeding without auth: {e}");
            None
        }
    }
}
