//! services/api/src/web/entries.rs
//!
//! Contains the Axum handlers for the user-scoped entry REST API and the
//! master definition for the OpenAPI specification. Every handler drives the
//! core entry gateway on behalf of the request's identity; a successful save
//! additionally detaches the sentiment analysis trigger.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{DateTime, Utc};
use diary_core::domain::{DiaryEntry, Identity};
use diary_core::gateway::DiaryError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::analyze::{AnalyzeError, AnalyzeRequest, AnalyzeResponse};
use crate::web::auth::{AuthResponse, LoginRequest, SessionResponse, SignupRequest};
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::session_handler,
        list_entries_handler,
        create_entry_handler,
        update_entry_handler,
        delete_entry_handler,
        crate::web::analyze::analyze_entry_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            AuthResponse,
            SessionResponse,
            SaveEntryRequest,
            EntryResponse,
            AnalyzeRequest,
            AnalyzeResponse,
            AnalyzeError,
        )
    ),
    tags(
        (name = "Diary API", description = "API endpoints for the personal diary.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SaveEntryRequest {
    pub content: String,
}

/// One diary entry as it goes over the wire.
#[derive(Serialize, ToSchema)]
pub struct EntryResponse {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// `{ "sentiment": "Positive" }` once analysis has completed.
    #[schema(value_type = Option<Object>)]
    pub analysis_result: Option<serde_json::Value>,
}

impl From<DiaryEntry> for EntryResponse {
    fn from(entry: DiaryEntry) -> Self {
        Self {
            id: entry.id,
            content: entry.content,
            created_at: entry.created_at,
            analysis_result: entry
                .analysis_result
                .and_then(|r| serde_json::to_value(r).ok()),
        }
    }
}

fn gateway_error(err: DiaryError) -> (StatusCode, String) {
    let status = match err {
        DiaryError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        DiaryError::NotFound => StatusCode::NOT_FOUND,
        DiaryError::Validation(_) => StatusCode::BAD_REQUEST,
        DiaryError::Remote(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the caller's entries, newest first.
#[utoipa::path(
    get,
    path = "/entries",
    responses(
        (status = 200, description = "The caller's entries, newest first", body = [EntryResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_entries_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<EntryResponse>>, (StatusCode, String)> {
    let entries = state
        .gateway_for(identity)
        .list()
        .await
        .map_err(gateway_error)?;
    Ok(Json(entries.into_iter().map(EntryResponse::from).collect()))
}

/// Create a new entry and detach sentiment analysis for it.
#[utoipa::path(
    post,
    path = "/entries",
    request_body = SaveEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 400, description = "Empty content"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SaveEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), (StatusCode, String)> {
    // Empty content never reaches the store.
    if req.content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Entry content cannot be empty.".to_string(),
        ));
    }

    let entry = state
        .gateway_for(identity)
        .create(&req.content)
        .await
        .map_err(gateway_error)?;

    // Best-effort enrichment, decoupled from this response.
    state.analysis.spawn(entry.id, req.content);

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Update an entry's content and detach sentiment analysis for it.
#[utoipa::path(
    put,
    path = "/entries/{id}",
    request_body = SaveEntryRequest,
    params(
        ("id" = Uuid, Path, description = "The entry to update")
    ),
    responses(
        (status = 200, description = "Entry updated", body = EntryResponse),
        (status = 400, description = "Empty content"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No entry with this id owned by the caller")
    )
)]
pub async fn update_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveEntryRequest>,
) -> Result<Json<EntryResponse>, (StatusCode, String)> {
    if req.content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Entry content cannot be empty.".to_string(),
        ));
    }

    let entry = state
        .gateway_for(identity)
        .update(id, &req.content)
        .await
        .map_err(gateway_error)?;

    state.analysis.spawn(entry.id, req.content);

    Ok(Json(entry.into()))
}

/// Delete an entry. Deleting an entry that is already gone succeeds.
#[utoipa::path(
    delete,
    path = "/entries/{id}",
    params(
        ("id" = Uuid, Path, description = "The entry to delete")
    ),
    responses(
        (status = 204, description = "Entry deleted (or already gone)"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn delete_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .gateway_for(identity)
        .delete(id)
        .await
        .map_err(gateway_error)?;
    Ok(StatusCode::NO_CONTENT)
}
