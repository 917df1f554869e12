//! paneltrack-server library interface
//!
//! Exposes the router and application state for integration testing.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod import;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::auth_routes())
        .merge(api::user_routes())
        .merge(api::venue_routes())
        .merge(api::panel_routes())
        .merge(api::candidate_routes())
        .merge(api::adviser_routes())
        .merge(api::task_routes())
        .merge(api::worship_schedule_routes())
        .merge(api::report_routes())
        .merge(api::analytics_routes())
        .merge(api::calendar_routes())
        .merge(api::import_routes())
        .merge(api::health_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
