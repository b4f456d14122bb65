// ABOUTME: HTTP request handlers for the Research Hub intake
// ABOUTME: Any malformed or out-of-bounds submission is answered with a generic 400

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{error, warn};

use super::response::{ApiError, ApiResult};
use crate::DbState;
use collector_research::ResearchInput;
use collector_storage::StorageError;

/// POST /api/research
pub async fn submit_research(
    State(db): State<DbState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let input: ResearchInput = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected research submission: {}", e);
        ApiError::Validation("Invalid input".to_string())
    })?;

    let submission = db
        .research_storage
        .submit(input)
        .await
        .map_err(|e| match e {
            StorageError::Validation(msg) => {
                warn!("Rejected research submission: {}", msg);
                ApiError::Validation("Invalid input".to_string())
            }
            other => {
                error!("Failed to save research item: {}", other);
                ApiError::Storage("Failed to save research item".to_string())
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Research added successfully",
            "data": submission,
        })),
    ))
}

/// GET /api/research
pub async fn list_research(State(db): State<DbState>) -> ApiResult<impl IntoResponse> {
    let items = db.research_storage.list_feed().await?;
    Ok(Json(items))
}
