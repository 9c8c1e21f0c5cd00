// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use backoffice_core::{AggregatorOptions, LiveSessionAggregator, LiveStore};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Data store used for health checks.
    pub store: Arc<dyn LiveStore>,
    /// Active-session aggregator over the same store.
    pub live: LiveSessionAggregator,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(store: Arc<dyn LiveStore>, options: AggregatorOptions) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            live: LiveSessionAggregator::new(store.clone(), options),
            store,
        })
    }

    /// Seconds since the server started.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
