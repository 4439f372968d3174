use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::server::configuration::SessionPoolSettings;
use crate::server::services::auth::TokenCache;

pub const DYNAMIC_SESSIONS_SCOPE: &str = "https://dynamicsessions.io/.default";

const SESSION_API_VERSION: &str = "2024-02-02-preview";
const EXECUTE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct SessionPayload {
    properties: SessionProperties,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionProperties {
    code_input_type: String,
    execution_type: String,
    code: String,
}

/// Outcome of one synchronous code execution. Failures are data, not errors;
/// callers never see an `Err` from this service.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ExecutionResult {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error,
            result: None,
            session_id: None,
        }
    }
}

pub struct SessionPoolService {
    config: SessionPoolSettings,
    tokens: TokenCache,
    client: reqwest::Client,
}

impl SessionPoolService {
    pub fn new(config: SessionPoolSettings, tokens: TokenCache) -> Self {
        Self {
            config,
            tokens,
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.config.endpoint.as_deref()
    }

    /// Runs a code snippet in the remote session pool.
    pub async fn execute(&self, code: &str) -> ExecutionResult {
        match self.try_execute(code).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Code execution failed");
                ExecutionResult::failure(format!("{:#}", e))
            }
        }
    }

    async fn try_execute(&self, code: &str) -> Result<ExecutionResult> {
        let endpoint = self
            .config
            .endpoint
            .as_ref()
            .ok_or_else(|| anyhow!("Session pool endpoint not configured"))?;

        let token = self.tokens.get().await?;

        let session_id = format!("session-{}", &Uuid::new_v4().simple().to_string()[..8]);

        let payload = SessionPayload {
            properties: SessionProperties {
                code_input_type: "inline".to_string(),
                execution_type: "synchronous".to_string(),
                code: code.to_string(),
            },
        };

        let url = format!(
            "{}/code/execute?api-version={}&identifier={}",
            endpoint, SESSION_API_VERSION, session_id
        );

        info!(session_id = %session_id, "Submitting code to session pool");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .timeout(EXECUTE_TIMEOUT)
            .send()
            .await
            .context("Failed to reach session pool")?;

        let status = response.status();
        if status.as_u16() != 200 {
            let body = response.text().await.unwrap_or_default();
            return Ok(ExecutionResult::failure(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .context("Failed to decode session pool response")?;

        let stdout = result
            .pointer("/properties/stdout")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let stderr = result
            .pointer("/properties/stderr")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(ExecutionResult {
            success: true,
            output: stdout,
            error: stderr,
            result: Some(result),
            session_id: Some(session_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::services::auth::{AccessToken, TokenCredential};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticCredential;

    #[async_trait]
    impl TokenCredential for StaticCredential {
        async fn get_token(&self, _scope: &str) -> anyhow::Result<AccessToken> {
            Ok(AccessToken {
                token: "test_token".to_string(),
                expires_on: Utc::now() + ChronoDuration::hours(1),
            })
        }
    }

    fn service(endpoint: Option<String>) -> SessionPoolService {
        SessionPoolService::new(
            SessionPoolSettings { endpoint },
            TokenCache::new(Arc::new(StaticCredential), DYNAMIC_SESSIONS_SCOPE),
        )
    }

    #[tokio::test]
    async fn executes_code_and_collects_output() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/code/execute"))
            .and(query_param("api-version", SESSION_API_VERSION))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "properties": {
                    "stdout": "4\n",
                    "stderr": ""
                }
            })))
            .mount(&mock_server)
            .await;

        let result = service(Some(mock_server.uri())).execute("print(2+2)").await;

        assert!(result.success);
        assert_eq!(result.output, "4\n");
        assert_eq!(result.error, "");
        assert!(result.session_id.unwrap().starts_with("session-"));
        assert!(result.result.is_some());
    }

    #[tokio::test]
    async fn non_200_becomes_structured_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/code/execute"))
            .respond_with(ResponseTemplate::new(503).set_body_string("pool exhausted"))
            .mount(&mock_server)
            .await;

        let result = service(Some(mock_server.uri())).execute("print(1)").await;

        assert!(!result.success);
        assert!(result.error.contains("HTTP 503"));
        assert!(result.error.contains("pool exhausted"));
        assert_eq!(result.output, "");
    }

    #[tokio::test]
    async fn missing_endpoint_is_reported_not_raised() {
        let result = service(None).execute("print(1)").await;

        assert!(!result.success);
        assert!(result.error.contains("Session pool endpoint not configured"));
    }

    #[tokio::test]
    async fn unreachable_pool_is_reported_not_raised() {
        let result = service(Some("http://127.0.0.1:1".to_string()))
            .execute("print(1)")
            .await;

        assert!(!result.success);
        assert!(!result.error.is_empty());
    }
}
