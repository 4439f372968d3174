use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::server::configuration::CredentialSettings;

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        self.expires_on <= Utc::now()
    }
}

#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// OAuth2 client-credentials flow against the Entra ID token endpoint.
///
/// Missing settings are not a startup error; the first token request
/// reports them instead, and the caller degrades per its own policy.
pub struct ClientCredentials {
    token_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<Secret<String>>,
    client: reqwest::Client,
}

impl ClientCredentials {
    pub fn from_settings(settings: &CredentialSettings) -> Self {
        let token_url = settings.tenant_id.as_ref().map(|tenant| {
            format!("https://login.microsoftonline.com/{}/oauth2/v2.0/token", tenant)
        });

        Self {
            token_url,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_token_url(token_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            token_url: Some(token_url),
            client_id: Some(client_id),
            client_secret: Some(Secret::new(client_secret)),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TokenCredential for ClientCredentials {
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let token_url = self
            .token_url
            .as_ref()
            .ok_or_else(|| anyhow!("Credential tenant is not configured"))?;
        let client_id = self
            .client_id
            .as_ref()
            .ok_or_else(|| anyhow!("Credential client id is not configured"))?;
        let client_secret = self
            .client_secret
            .as_ref()
            .ok_or_else(|| anyhow!("Credential client secret is not configured"))?;

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.expose_secret().as_str()),
            ("scope", scope),
        ];

        let response = self
            .client
            .post(token_url)
            .form(&params)
            .send()
            .await
            .context("Failed to reach token endpoint")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Token request failed: HTTP {}: {}", status, body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to decode token response")?;

        Ok(AccessToken {
            token: token.access_token,
            expires_on: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

/// Lazily-refreshed bearer token for a single scope.
///
/// The slot is refreshed under a mutex when the cached token has passed its
/// expiry timestamp, so concurrent callers serialize on refresh rather than
/// racing the credential.
pub struct TokenCache {
    credential: Arc<dyn TokenCredential>,
    scope: String,
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(credential: Arc<dyn TokenCredential>, scope: &str) -> Self {
        Self {
            credential,
            scope: scope.to_string(),
            slot: Mutex::new(None),
        }
    }

    pub async fn get(&self) -> Result<String> {
        let mut slot = self.slot.lock().await;

        if let Some(token) = slot.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let fresh = self
            .credential
            .get_token(&self.scope)
            .await
            .context("Failed to acquire access token")?;
        let value = fresh.token.clone();
        *slot = Some(fresh);

        Ok(value)
    }
}
