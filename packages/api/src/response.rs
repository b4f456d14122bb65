// ABOUTME: Shared API error type and response helpers
// ABOUTME: Maps storage and webhook failures onto HTTP status codes and the JSON error body

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use collector_runs::TriggerError;
use collector_storage::StorageError;

/// Every handler failure ends up here
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Store failures pass their message through unchanged
    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{message}")]
    Upstream { message: String, details: String },
}

/// `{"success": false, "error": ...}`
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Storage(_) | ApiError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Validation(msg) => ApiError::Validation(msg),
            StorageError::Conflict(msg) => ApiError::Conflict(msg),
            StorageError::NotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl From<TriggerError> for ApiError {
    fn from(err: TriggerError) -> Self {
        match err {
            TriggerError::NotConfigured => ApiError::Configuration(
                "N8N_WEBHOOK_URL is not configured".to_string(),
            ),
            TriggerError::Status { ref body, .. } => ApiError::Upstream {
                message: err.to_string(),
                details: body.clone(),
            },
            TriggerError::Transport(_) => ApiError::Upstream {
                message: err.to_string(),
                details: String::new(),
            },
            TriggerError::Storage(storage) => storage.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// `Json` extractor whose rejections use the API error body (400)
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        } else {
            warn!(status = status.as_u16(), "Request rejected: {}", self);
        }

        let details = match &self {
            ApiError::Upstream { details, .. } => Some(details.clone()),
            _ => None,
        };
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            details,
        };

        (status, ResponseJson(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `{"success": true}`
pub fn success() -> ResponseJson<serde_json::Value> {
    ResponseJson(serde_json::json!({ "success": true }))
}
