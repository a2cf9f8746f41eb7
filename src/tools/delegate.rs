use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use crate::config::ExecutorConfig;
use crate::errors::CoreError;
use super::state::Priority;

/// Payload sent to the external executor.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteRequest {
    pub execution_id: String,
    pub tool_id: String,
    pub tool_name: String,
    pub category: String,
    pub params: Value,
    pub priority: Priority,
}

/// External tool executor. Every failure is reported as
/// `DelegationUnavailable` so the broker can fall back locally.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Liveness probe
    async fn health(&self) -> Result<(), CoreError>;

    async fn execute(&self, request: &RemoteRequest) -> Result<Value, CoreError>;

    /// Upper bound the broker applies around `execute`.
    fn execution_timeout(&self) -> Duration;

    fn base_url(&self) -> &str;
}

pub struct HttpExecutor {
    client: Client,
    base_url: String,
    health_timeout: Duration,
    execution_timeout: Duration,
}

impl HttpExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_timeout: Duration::from_millis(config.health_timeout_ms),
            execution_timeout: Duration::from_millis(config.execution_timeout_ms),
        }
    }
}

#[async_trait]
impl RemoteExecutor for HttpExecutor {
    async fn health(&self) -> Result<(), CoreError> {
        let resp = self.client
            .get(format!("{}/health", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| CoreError::DelegationUnavailable(format!("Health probe failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(CoreError::DelegationUnavailable(format!(
                "Health probe returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn execute(&self, request: &RemoteRequest) -> Result<Value, CoreError> {
        let resp = self.client
            .post(format!("{}/tools/execute", self.base_url))
            .timeout(self.execution_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| CoreError::DelegationUnavailable(format!("Execution request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(CoreError::DelegationUnavailable(format!(
                "Executor returned {}",
                resp.status()
            )));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| CoreError::DelegationUnavailable(format!("Parse error: {}", e)))
    }

    fn execution_timeout(&self) -> Duration {
        self.execution_timeout
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
