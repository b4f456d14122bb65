// ABOUTME: Workflow webhook client used to start processing of a run
// ABOUTME: Trait seam plus a reqwest implementation with optional basic auth

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use collector_storage::StorageError;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Workflow webhook is not configured")]
    NotConfigured,

    #[error("n8n webhook failed with status {status}")]
    Status { status: u16, body: String },

    #[error("Failed to call webhook: {0}")]
    Transport(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Starts the external workflow for a run
#[async_trait]
pub trait WorkflowWebhook: Send + Sync {
    async fn trigger(&self, run_id: &str) -> Result<(), TriggerError>;
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Calls `GET {url}?runId={id}`
pub struct HttpWorkflowWebhook {
    http_client: Client,
    config: WebhookConfig,
}

impl HttpWorkflowWebhook {
    pub fn new(config: WebhookConfig) -> Result<Self, TriggerError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TriggerError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl WorkflowWebhook for HttpWorkflowWebhook {
    async fn trigger(&self, run_id: &str) -> Result<(), TriggerError> {
        debug!(run_id = %run_id, url = %self.config.url, "Calling workflow webhook");

        let mut request = self
            .http_client
            .get(&self.config.url)
            .query(&[("runId", run_id)]);

        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        let response = request.send().await.map_err(|e| {
            error!(run_id = %run_id, "Webhook request failed: {}", e);
            TriggerError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                run_id = %run_id,
                status = status.as_u16(),
                "Webhook returned non-success status"
            );
            return Err(TriggerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
