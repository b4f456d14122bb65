// ABOUTME: HTTP API layer for Collector providing REST endpoints and routing
// ABOUTME: Integration layer that depends on all domain packages

use axum::{
    routing::{delete, get, post},
    Router,
};

pub mod db;
pub mod entries_handlers;
pub mod events_handlers;
pub mod health;
pub mod reports_handlers;
pub mod research_handlers;
pub mod response;
pub mod runs_handlers;

pub use db::DbState;
pub use response::{ApiError, ApiResult};

/// Creates the Collector API router (nested under /api/v1)
pub fn create_collector_router() -> Router<DbState> {
    Router::new()
        // Types
        .route(
            "/types",
            get(entries_handlers::list_types).post(entries_handlers::create_type),
        )
        // Entries
        .route(
            "/entries",
            get(entries_handlers::list_entries).post(entries_handlers::create_entries),
        )
        .route(
            "/entries/bulk-status",
            post(entries_handlers::bulk_update_status),
        )
        .route("/entries/bulk-delete", post(entries_handlers::bulk_delete))
        .route(
            "/entries/{id}",
            get(entries_handlers::get_entry)
                .patch(entries_handlers::update_entry)
                .delete(entries_handlers::delete_entry),
        )
        .route("/list/{type}", get(entries_handlers::list_pending))
        // Runs
        .route(
            "/run",
            get(runs_handlers::list_runs).post(runs_handlers::create_run),
        )
        .route(
            "/run/{id}",
            get(runs_handlers::get_run)
                .patch(runs_handlers::update_run)
                .delete(runs_handlers::delete_run),
        )
        .route("/run/{id}/claim", post(runs_handlers::claim_entries))
        .route("/run/{id}/entries", post(runs_handlers::attach_entries))
        .route(
            "/run/{id}/entries/{entry_id}",
            delete(runs_handlers::remove_entry),
        )
        .route("/run/{id}/trigger", post(runs_handlers::trigger_run))
        // Reports
        .route(
            "/report",
            get(reports_handlers::list_reports).post(reports_handlers::create_report),
        )
        .route(
            "/report/{id}",
            get(reports_handlers::get_report).delete(reports_handlers::delete_report),
        )
        .route("/report/{id}/done", post(reports_handlers::mark_done))
        // Invalidation stream
        .route("/events", get(events_handlers::invalidation_events))
}

/// Creates the Research Hub router
pub fn create_research_router() -> Router<DbState> {
    Router::new().route(
        "/api/research",
        get(research_handlers::list_research).post(research_handlers::submit_research),
    )
}

/// Full API surface with state applied
pub fn create_app(state: DbState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/v1", create_collector_router())
        .merge(create_research_router())
        .with_state(state)
}
