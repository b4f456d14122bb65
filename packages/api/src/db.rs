// ABOUTME: Shared handler state wrapping the SQLite pool and every storage layer
// ABOUTME: Built once at startup and cloned into each request

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use collector_core::InvalidationBus;
use collector_entries::{EntryStorage, TypeStorage};
use collector_reports::ReportStorage;
use collector_research::ResearchStorage;
use collector_runs::{RunStorage, RunTrigger, WorkflowWebhook};

/// Shared database state for API handlers
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub bus: InvalidationBus,
    pub type_storage: Arc<TypeStorage>,
    pub entry_storage: Arc<EntryStorage>,
    pub run_storage: Arc<RunStorage>,
    pub run_trigger: RunTrigger,
    pub report_storage: Arc<ReportStorage>,
    pub research_storage: Arc<ResearchStorage>,
}

impl DbState {
    /// Create state from a migrated pool. Without a webhook, triggering runs is refused.
    pub fn new(pool: SqlitePool, webhook: Option<Arc<dyn WorkflowWebhook>>) -> Self {
        let bus = InvalidationBus::new();

        let type_storage = Arc::new(TypeStorage::new(pool.clone(), bus.clone()));
        let entry_storage = Arc::new(EntryStorage::new(pool.clone(), bus.clone()));
        let run_storage = Arc::new(RunStorage::new(pool.clone(), bus.clone()));
        let report_storage = Arc::new(ReportStorage::new(pool.clone(), bus.clone()));
        let research_storage = Arc::new(ResearchStorage::new(pool.clone(), bus.clone()));

        if webhook.is_none() {
            info!("No workflow webhook configured; run triggering is disabled");
        }
        let run_trigger = RunTrigger::new(run_storage.clone(), webhook);

        debug!("Database state initialized");

        Self {
            pool,
            bus,
            type_storage,
            entry_storage,
            run_storage,
            run_trigger,
            report_storage,
            research_storage,
        }
    }
}
