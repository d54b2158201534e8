//! services/api/src/web/analyze.rs
//!
//! The hosted sentiment-function endpoint. Mirrors the classifier's wire
//! contract: `{"entryContent": ...}` in, `{"sentiment": ...}` out, and a JSON
//! `{"error": ...}` body on failure. CORS (including the OPTIONS preflight)
//! is handled by the router layer.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    #[serde(rename = "entryContent")]
    pub entry_content: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub sentiment: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnalyzeError {
    pub error: String,
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /functions/analyze-entry - Classify the sentiment of a piece of text
#[utoipa::path(
    post,
    path = "/functions/analyze-entry",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Sentiment classified", body = AnalyzeResponse),
        (status = 400, description = "Missing entry content", body = AnalyzeError),
        (status = 500, description = "Classifier failure", body = AnalyzeError)
    )
)]
pub async fn analyze_entry_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<AnalyzeError>)> {
    if req.entry_content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(AnalyzeError {
                error: "Missing entryContent in request body".to_string(),
            }),
        ));
    }

    match state.classifier.classify(&req.entry_content).await {
        Ok(sentiment) => Ok(Json(AnalyzeResponse {
            sentiment: sentiment.to_string(),
        })),
        Err(err) => {
            error!(error = %err, "sentiment classification failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AnalyzeError {
                    error: "Failed to analyze sentiment".to_string(),
                }),
            ))
        }
    }
}
