// ABOUTME: Hands a run to the workflow webhook
// ABOUTME: Marks the run running first and reverts it to created if the call fails

use std::sync::Arc;

use tracing::{error, info, warn};

use super::storage::RunStorage;
use super::types::{Run, RunStatus, RunUpdateInput};
use super::webhook::{TriggerError, WorkflowWebhook};

#[derive(Clone)]
pub struct RunTrigger {
    storage: Arc<RunStorage>,
    webhook: Option<Arc<dyn WorkflowWebhook>>,
}

impl RunTrigger {
    pub fn new(storage: Arc<RunStorage>, webhook: Option<Arc<dyn WorkflowWebhook>>) -> Self {
        Self { storage, webhook }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook.is_some()
    }

    /// Start the workflow for `run_id`.
    ///
    /// No retries. A failed call puts the run back to `created` exactly once.
    pub async fn trigger(&self, run_id: &str) -> Result<Run, TriggerError> {
        let webhook = self.webhook.as_ref().ok_or_else(|| {
            warn!(run_id = %run_id, "Trigger requested but no webhook is configured");
            TriggerError::NotConfigured
        })?;

        let run = self
            .storage
            .update_run(run_id, RunUpdateInput::status(RunStatus::Running))
            .await?;

        if let Err(err) = webhook.trigger(run_id).await {
            error!(run_id = %run_id, "Webhook trigger failed, reverting run: {}", err);
            if let Err(revert_err) = self.storage.revert_to_created(run_id).await {
                error!(run_id = %run_id, "Failed to revert run: {}", revert_err);
            }
            return Err(err);
        }

        info!(run_id = %run_id, "Webhook triggered successfully");
        Ok(run)
    }
}
