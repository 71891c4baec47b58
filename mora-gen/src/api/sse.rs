//! Server-Sent Events (SSE) for session progress streaming

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use mora_common::sse::session_sse_stream;
use tracing::info;

use super::session::parse_session_id;
use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// GET /api/session/:id/stream
///
/// Replays the session log, then follows live events until the terminal
/// `done` / `error` event. Idle periods produce `: heartbeat` comments.
pub async fn session_event_stream(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let session_id = parse_session_id(&session_id)?;

    let entry = state.store.get(session_id).await.ok_or_else(|| {
        ApiError::NotFound(format!("Session not found or no longer streaming: {}", session_id))
    })?;

    let subscription = entry.events().subscribe();

    info!(
        session_id = %session_id,
        replay = subscription.replay().len(),
        live = subscription.is_live(),
        "New SSE client connected to session events"
    );

    Ok(session_sse_stream(subscription, state.keep_alive))
}
