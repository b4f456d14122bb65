// ABOUTME: HTTP request handlers for runs
// ABOUTME: Run CRUD, entry claiming and release, and triggering the workflow webhook

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::response::{success, ApiError, ApiJson, ApiResult};
use crate::DbState;
use collector_runs::{RunCreateInput, RunUpdateInput};

#[derive(Deserialize)]
pub struct CreateRunRequest {
    pub name: Option<String>,
    pub type_id: Option<String>,
    pub limit_count: Option<i64>,
}

/// POST /api/v1/run
pub async fn create_run(
    State(db): State<DbState>,
    ApiJson(request): ApiJson<CreateRunRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(name), Some(type_id)) = (request.name, request.type_id) else {
        return Err(ApiError::Validation(
            "name and type_id are required".to_string(),
        ));
    };

    info!("Creating run '{}' for type {}", name, type_id);
    let run = db
        .run_storage
        .create_run(RunCreateInput {
            name,
            type_id,
            limit_count: request.limit_count,
        })
        .await?;

    Ok(Json(serde_json::json!({ "run_id": run.id })))
}

pub async fn list_runs(State(db): State<DbState>) -> ApiResult<impl IntoResponse> {
    let runs = db.run_storage.list_runs().await?;
    info!("Fetched {} runs", runs.len());
    Ok(Json(runs))
}

pub async fn get_run(
    State(db): State<DbState>,
    Path(run_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let run = db.run_storage.get_run_with_entries(&run_id).await?;
    Ok(Json(run))
}

/// PATCH /api/v1/run/{id}
pub async fn update_run(
    State(db): State<DbState>,
    Path(run_id): Path<String>,
    ApiJson(input): ApiJson<RunUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    info!("Updating run {}: status={:?}", run_id, input.status);
    let run = db.run_storage.update_run(&run_id, input).await?;
    Ok(Json(serde_json::json!({ "success": true, "run": run })))
}

pub async fn delete_run(
    State(db): State<DbState>,
    Path(run_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting run: {}", run_id);
    db.run_storage.delete_run(&run_id).await?;
    Ok(success())
}

#[derive(Deserialize)]
pub struct ClaimRequest {
    pub type_id: Option<String>,
    pub limit: Option<i64>,
}

/// POST /api/v1/run/{id}/claim
pub async fn claim_entries(
    State(db): State<DbState>,
    Path(run_id): Path<String>,
    ApiJson(request): ApiJson<ClaimRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(type_id), Some(limit)) = (
        request.type_id.filter(|t| !t.is_empty()),
        request.limit.filter(|l| *l > 0),
    ) else {
        return Err(ApiError::Validation(
            "type_id and limit are required".to_string(),
        ));
    };

    info!("Claiming up to {} entries of {} for run {}", limit, type_id, run_id);
    let result = db
        .run_storage
        .claim_entries(&run_id, &type_id, limit)
        .await?;

    if result.entries.is_empty() {
        return Ok(Json(serde_json::json!({
            "entries": [],
            "claimed_count": 0,
            "message": "No pending entries found",
        })));
    }

    Ok(Json(serde_json::to_value(result).map_err(|e| ApiError::Storage(e.to_string()))?))
}

#[derive(Deserialize)]
pub struct AttachEntriesRequest {
    #[serde(default)]
    pub entry_ids: Vec<String>,
}

/// POST /api/v1/run/{id}/entries - hand-picked entries
pub async fn attach_entries(
    State(db): State<DbState>,
    Path(run_id): Path<String>,
    ApiJson(request): ApiJson<AttachEntriesRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Attaching {} entries to run {}", request.entry_ids.len(), run_id);
    let result = db
        .run_storage
        .attach_entries(&run_id, &request.entry_ids)
        .await?;
    Ok(Json(result))
}

pub async fn remove_entry(
    State(db): State<DbState>,
    Path((run_id, entry_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    info!("Removing entry {} from run {}", entry_id, run_id);
    db.run_storage.remove_entry(&run_id, &entry_id).await?;
    Ok(success())
}

/// POST /api/v1/run/{id}/trigger
pub async fn trigger_run(
    State(db): State<DbState>,
    Path(run_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Triggering run: {}", run_id);
    db.run_trigger.trigger(&run_id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Webhook triggered successfully",
    })))
}
