// ABOUTME: HTTP request handlers for reports
// ABOUTME: Creating reports over entries, finishing them, and deleting them with their run

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::response::{success, ApiError, ApiJson, ApiResult};
use crate::DbState;
use collector_reports::{ReportCreateInput, ReportStatus};

#[derive(Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<String>,
}

pub async fn list_reports(
    State(db): State<DbState>,
    Query(query): Query<ListReportsQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = query
        .status
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ReportStatus>())
        .transpose()
        .map_err(ApiError::Validation)?;

    let reports = db.report_storage.list_reports(status).await?;
    Ok(Json(reports))
}

pub async fn get_report(
    State(db): State<DbState>,
    Path(report_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let report = db.report_storage.get_report_with_entries(&report_id).await?;
    Ok(Json(report))
}

/// POST /api/v1/report
pub async fn create_report(
    State(db): State<DbState>,
    ApiJson(input): ApiJson<ReportCreateInput>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "Creating report over {} entries (run: {:?})",
        input.entry_ids.len(),
        input.run_id
    );
    let report = db.report_storage.create_report(input).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "report_id": report.id,
    })))
}

/// POST /api/v1/report/{id}/done
pub async fn mark_done(
    State(db): State<DbState>,
    Path(report_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Marking report {} done", report_id);
    db.report_storage.mark_done(&report_id).await?;
    Ok(success())
}

pub async fn delete_report(
    State(db): State<DbState>,
    Path(report_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    info!("Deleting report: {}", report_id);
    db.report_storage.delete_report(&report_id).await?;
    Ok(success())
}
