// ABOUTME: Run lifecycle management for Collector
// ABOUTME: Creating runs, claiming pending entries into them, and handing them to the workflow webhook

pub mod storage;
pub mod trigger;
pub mod types;
pub mod webhook;

pub use storage::RunStorage;
pub use trigger::RunTrigger;
pub use types::{ClaimResult, Run, RunCreateInput, RunStatus, RunUpdateInput, RunWithEntries};
pub use webhook::{HttpWorkflowWebhook, TriggerError, WebhookConfig, WorkflowWebhook};
