use std::sync::Arc;

use axum::{
    extract::{multipart::Multipart, rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use ironvault_engine::{InputFormatError, LoanError};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

// --- Errors ---

/// `{"error": "..."}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::Validation(e) => ApiError::bad_request(e.to_string()),
            LoanError::Scoring(e) => {
                warn!(error = %e, "Model prediction failed");
                ApiError::internal("Model prediction failed")
            }
            LoanError::Persistence(reason) => {
                warn!(error = %reason, "Failed to store loan data");
                ApiError::internal("Failed to store loan data")
            }
        }
    }
}

impl From<InputFormatError> for ApiError {
    fn from(err: InputFormatError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

// --- Query structs ---

#[derive(Debug, Default, Deserialize)]
pub struct BatchQuery {
    /// Return `{results, rejected}` instead of the bare results array.
    #[serde(default)]
    detailed: bool,
}

// --- Handlers ---

pub async fn api_loan(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let Value::Object(raw) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    let summary = state.pipeline.process_loan(raw).await?;
    Ok(Json(summary).into_response())
}

pub async fn api_batch(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BatchQuery>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text())))?;
        upload = Some((filename, content));
        break;
    }

    let Some((filename, content)) = upload else {
        let err = InputFormatError::MissingFile;
        state
            .pipeline
            .logger()
            .log("batch_validation_failed", "error", json!({ "error": err.to_string() }))
            .await;
        return Err(err.into());
    };

    let report = state.pipeline.process_upload(&filename, &content).await?;
    if params.detailed {
        Ok(Json(report).into_response())
    } else {
        Ok(Json(report.results).into_response())
    }
}

pub async fn api_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.pipeline.check_health().await)
}
