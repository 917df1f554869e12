//! Venue endpoints

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
pub struct VenueRequest {
    pub name: String,
    pub address: Option<String>,
    pub capacity: Option<i64>,
    pub notes: Option<String>,
}

fn validate(payload: &VenueRequest) -> ApiResult<()> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Venue name cannot be empty".to_string()));
    }
    Ok(())
}

/// GET /api/venues
pub async fn list_venues(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<db::venues::Venue>>> {
    require_user(&state, &headers).await?;
    Ok(Json(db::venues::list_venues(&state.db).await?))
}

/// POST /api/venues
pub async fn create_venue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<VenueRequest>,
) -> ApiResult<Json<db::venues::Venue>> {
    require_user(&state, &headers).await?;
    validate(&payload)?;

    let venue = db::venues::Venue {
        guid: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        address: payload.address,
        capacity: payload.capacity,
        notes: payload.notes,
    };

    db::venues::create_venue(&state.db, &venue).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict(format!("Venue '{}' already exists", venue.name))
        } else {
            e.into()
        }
    })?;

    Ok(Json(venue))
}

/// GET /api/venues/:guid
pub async fn get_venue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<db::venues::Venue>> {
    require_user(&state, &headers).await?;

    let venue = db::venues::load_venue(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Venue {}", guid)))?;

    Ok(Json(venue))
}

/// PUT /api/venues/:guid
pub async fn update_venue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<VenueRequest>,
) -> ApiResult<Json<db::venues::Venue>> {
    require_user(&state, &headers).await?;
    validate(&payload)?;

    let venue = db::venues::Venue {
        guid,
        name: payload.name.trim().to_string(),
        address: payload.address,
        capacity: payload.capacity,
        notes: payload.notes,
    };

    let updated = db::venues::update_venue(&state.db, &venue).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict(format!("Venue '{}' already exists", venue.name))
        } else {
            e.into()
        }
    })?;

    if !updated {
        return Err(ApiError::NotFound(format!("Venue {}", guid)));
    }

    Ok(Json(venue))
}

/// DELETE /api/venues/:guid
///
/// Answers 409 while panels still reference the venue.
pub async fn delete_venue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;

    let deleted = db::venues::delete_venue(&state.db, guid).await.map_err(|e| {
        if db::is_fk_violation(&e) {
            ApiError::Conflict("Venue is still used by one or more panels".to_string())
        } else {
            e.into()
        }
    })?;

    if !deleted {
        return Err(ApiError::NotFound(format!("Venue {}", guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Build venue routes
pub fn venue_routes() -> Router<AppState> {
    Router::new()
        .route("/api/venues", get(list_venues).post(create_venue))
        .route(
            "/api/venues/:guid",
            get(get_venue).put(update_venue).delete(delete_venue),
        )
}
