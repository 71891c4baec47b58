//! mora-gen library interface
//!
//! Exposes the router, state and services for the binary and for
//! integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod session_store;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::PipelineDriver;
use crate::session_store::SessionStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// In-memory session arena
    pub store: Arc<SessionStore>,
    /// Pipeline driver shared by all sessions
    pub driver: Arc<PipelineDriver>,
    /// Idle interval before an SSE heartbeat
    pub keep_alive: Duration,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<SessionStore>, driver: Arc<PipelineDriver>, keep_alive: Duration) -> Self {
        Self {
            store,
            driver,
            keep_alive,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::session_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for the browser client
        .layer(CorsLayer::permissive())
}
