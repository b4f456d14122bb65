// ABOUTME: HTTP request handlers for types and entries
// ABOUTME: CRUD, bulk operations, and the plain-text pending list consumed by the workflow

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::str::FromStr;
use tracing::info;

use super::response::{success, ApiError, ApiJson, ApiResult};
use crate::DbState;
use collector_core::DEFAULT_PENDING_LIST_LIMIT;
use collector_entries::{Entry, EntryCreateInput, EntryFilter, EntryStatus, EntryUpdateInput};

// ==================== Types ====================

pub async fn list_types(State(db): State<DbState>) -> ApiResult<impl IntoResponse> {
    let types = db.type_storage.list_types().await?;
    Ok(Json(types))
}

#[derive(Deserialize)]
pub struct CreateTypeRequest {
    pub name: Option<String>,
}

pub async fn create_type(
    State(db): State<DbState>,
    ApiJson(request): ApiJson<CreateTypeRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = request
        .name
        .ok_or_else(|| ApiError::Validation("name is required".to_string()))?;

    info!("Creating type: {}", name);
    let entry_type = db.type_storage.create_type(&name).await?;
    Ok((StatusCode::CREATED, Json(entry_type)))
}

// ==================== Entries ====================

/// Query parameters for listing entries. `type_id` accepts a comma-separated list.
#[derive(Deserialize)]
pub struct ListEntriesQuery {
    pub status: Option<String>,
    pub type_id: Option<String>,
}

pub async fn list_entries(
    State(db): State<DbState>,
    Query(query): Query<ListEntriesQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = query
        .status
        .filter(|s| !s.is_empty())
        .map(|s| EntryStatus::from_str(&s))
        .transpose()
        .map_err(ApiError::Validation)?;

    let type_ids = query.type_id.filter(|s| !s.is_empty()).map(|ids| {
        ids.split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect::<Vec<_>>()
    });

    let entries = db
        .entry_storage
        .list_entries(EntryFilter { status, type_ids })
        .await?;
    Ok(Json(entries))
}

pub async fn get_entry(
    State(db): State<DbState>,
    Path(entry_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let entry = db.entry_storage.get_entry(&entry_id).await?;
    Ok(Json(entry))
}

#[derive(Deserialize)]
pub struct CreateEntriesRequest {
    pub content: Option<String>,
    #[serde(default)]
    pub type_ids: Vec<String>,
}

pub async fn create_entries(
    State(db): State<DbState>,
    ApiJson(request): ApiJson<CreateEntriesRequest>,
) -> ApiResult<impl IntoResponse> {
    let content = request
        .content
        .ok_or_else(|| ApiError::Validation("content is required".to_string()))?;

    info!("Creating entry for {} type(s)", request.type_ids.len());
    let entries = db
        .entry_storage
        .create_entries(EntryCreateInput {
            content,
            type_ids: request.type_ids,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(entries)))
}

pub async fn update_entry(
    State(db): State<DbState>,
    Path(entry_id): Path<String>,
    ApiJson(input): ApiJson<EntryUpdateInput>,
) -> ApiResult<impl IntoResponse> {
    info!("Updating entry: {}", entry_id);
    let entry = db.entry_storage.update_entry(&entry_id, input).await?;
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(db): State<DbState>,
    Path(entry_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting entry: {}", entry_id);
    db.entry_storage.delete_entry(&entry_id).await?;
    Ok(success())
}

#[derive(Deserialize)]
pub struct BulkStatusRequest {
    #[serde(default)]
    pub ids: Vec<String>,
    pub status: EntryStatus,
}

pub async fn bulk_update_status(
    State(db): State<DbState>,
    ApiJson(request): ApiJson<BulkStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.ids.is_empty() {
        return Err(ApiError::Validation("ids are required".to_string()));
    }

    info!(
        "Setting {} entries to {}",
        request.ids.len(),
        request.status
    );
    let updated = db
        .entry_storage
        .bulk_update_status(&request.ids, request.status)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "updated": updated })))
}

#[derive(Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<String>,
}

pub async fn bulk_delete(
    State(db): State<DbState>,
    ApiJson(request): ApiJson<BulkDeleteRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.ids.is_empty() {
        return Err(ApiError::Validation("ids are required".to_string()));
    }

    info!("Deleting {} entries", request.ids.len());
    let deleted = db.entry_storage.bulk_delete(&request.ids).await?;

    Ok(Json(serde_json::json!({ "success": true, "deleted": deleted })))
}

// ==================== Pending list ====================

#[derive(Deserialize)]
pub struct PendingListQuery {
    pub limit: Option<String>,
}

/// GET /api/v1/list/{type} - numbered plain-text list of pending entries
pub async fn list_pending(
    State(db): State<DbState>,
    Path(type_id): Path<String>,
    Query(query): Query<PendingListQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query
        .limit
        .and_then(|l| l.trim().parse::<i64>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_PENDING_LIST_LIMIT);

    info!("Listing up to {} pending entries for type {}", limit, type_id);
    let entries = db.entry_storage.list_pending(&type_id, limit).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format_pending_list(&entries),
    ))
}

pub fn format_pending_list(entries: &[Entry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}. ID: {}\n   Content: {}\n   Date: {}\n",
                i + 1,
                entry.id,
                entry.content,
                entry.created_at.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
