//! Worship schedule endpoints
//!
//! One schedule per panel holding an ordered array of services.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::require_user;
use crate::db;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct WorshipScheduleRequest {
    /// Ordered list of services (day, time, title, leader, notes)
    pub services: serde_json::Value,
}

async fn panel_or_404(state: &AppState, guid: Uuid) -> ApiResult<()> {
    db::panels::load_panel(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Panel {}", guid)))?;
    Ok(())
}

/// GET /api/panels/:guid/worship-schedule
pub async fn get_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<db::worship::WorshipSchedule>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    let schedule = db::worship::load_for_panel(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No worship schedule for panel {}", guid)))?;

    Ok(Json(schedule))
}

/// PUT /api/panels/:guid/worship-schedule
///
/// Upserts the schedule, replacing the services array wholesale.
pub async fn put_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<WorshipScheduleRequest>,
) -> ApiResult<Json<db::worship::WorshipSchedule>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    if !payload.services.is_array() {
        return Err(ApiError::BadRequest("services must be an array".to_string()));
    }

    db::worship::upsert_for_panel(&state.db, guid, &payload.services).await?;

    let schedule = db::worship::load_for_panel(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::Internal("Schedule vanished after upsert".to_string()))?;

    Ok(Json(schedule))
}

/// DELETE /api/panels/:guid/worship-schedule
pub async fn delete_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    let deleted = db::worship::delete_for_panel(&state.db, guid).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("No worship schedule for panel {}", guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Build worship schedule routes
pub fn worship_schedule_routes() -> Router<AppState> {
    Router::new().route(
        "/api/panels/:guid/worship-schedule",
        get(get_schedule).put(put_schedule).delete(delete_schedule),
    )
}
