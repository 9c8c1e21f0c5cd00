//! Live monitoring endpoint.
//!
//! - `GET /api/live/active-sessions` -- every running time-tracking session,
//!   enriched with names and durations, longest-running first.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use backoffice_core::ActiveSessionsResponse;

use crate::error::{ApiError, ApiResult};
use crate::metrics::{record_active_sessions, RequestTimer};
use crate::state::AppState;

/// Build the live monitoring sub-router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/live/active-sessions", get(active_sessions))
}

/// GET /api/live/active-sessions
///
/// Empty set → `{success: true, data: [], count: 0}`. Store failures map to a
/// 500 envelope and an exceeded deadline to a 504 envelope (see [`ApiError`]).
pub async fn active_sessions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ActiveSessionsResponse>> {
    let timer = RequestTimer::new("live_active_sessions");

    match state.live.active_sessions().await {
        Ok(sessions) => {
            tracing::debug!(count = sessions.len(), "Active sessions aggregated");
            record_active_sessions(sessions.len());
            timer.finish_ok();
            Ok(Json(ActiveSessionsResponse::new(sessions)))
        }
        Err(e) => {
            timer.finish_err(if e.is_timeout() { 504 } else { 500 });
            Err(ApiError::LiveSessions(e))
        }
    }
}
