//! Session API handlers
//!
//! POST /api/session, GET /api/session/:id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{SessionSnapshot, SessionStatus},
    AppState,
};

/// POST /api/session request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub video_url: String,
}

/// POST /api/session response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub video_url: String,
}

/// Parse a session id path segment (400 on malformed ids)
pub(crate) fn parse_session_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid session ID: {}", raw)))
}

/// POST /api/session
///
/// Registers the session and starts its supervised pipeline. URL support is
/// checked by the pipeline itself, so an unsupported URL still yields a
/// session whose stream carries the `error` event.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    let video_url = request.video_url.trim().to_string();
    if video_url.is_empty() {
        return Err(ApiError::BadRequest("videoUrl must not be empty".to_string()));
    }

    let entry = state.store.create(video_url.clone()).await?;
    let response = CreateSessionResponse {
        session_id: entry.id(),
        status: SessionStatus::Created,
        video_url,
    };

    tracing::info!(
        session_id = %response.session_id,
        video_url = %response.video_url,
        "Session accepted - starting pipeline"
    );

    state.driver.spawn_supervised(entry);

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/session/:id
///
/// In-memory sessions first, then the persisted record.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session_id = parse_session_id(&session_id)?;

    if let Some(entry) = state.store.get(session_id).await {
        return Ok(Json(entry.snapshot().await));
    }

    let persisted = state.store.load_persisted(session_id).await?;
    persisted
        .map(|session| Json(session.snapshot(0)))
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/session/:id", get(get_session))
        .route("/api/session/:id/stream", get(super::sse::session_event_stream))
}
