//! API route handlers for the back-office server.

pub mod health;
pub mod live;
pub mod metrics;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET /api/health - Health check (includes data store ping)
/// - GET /api/live/active-sessions - Running time-tracking sessions
/// - GET /metrics - Prometheus metrics (no /api prefix)
pub fn api_routes(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(health::router())
        .merge(live::router());

    Router::new()
        .nest("/api", api)
        .merge(metrics::router())
        .with_state(state)
}
