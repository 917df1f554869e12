//! Adviser endpoints

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
pub struct AdviserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub quality: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

fn validate(payload: &AdviserRequest) -> ApiResult<()> {
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "First and last name are required".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/advisers
pub async fn list_advisers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<db::advisers::Adviser>>> {
    require_user(&state, &headers).await?;
    Ok(Json(db::advisers::list_advisers(&state.db).await?))
}

/// POST /api/advisers
pub async fn create_adviser(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AdviserRequest>,
) -> ApiResult<Json<db::advisers::Adviser>> {
    require_user(&state, &headers).await?;
    validate(&payload)?;

    let adviser = db::advisers::Adviser {
        guid: Uuid::new_v4(),
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: payload.email,
        quality: payload.quality,
        phone: payload.phone,
        notes: payload.notes,
    };

    db::advisers::create_adviser(&state.db, &adviser).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict("An adviser with that email already exists".to_string())
        } else {
            e.into()
        }
    })?;

    Ok(Json(adviser))
}

/// GET /api/advisers/:guid
pub async fn get_adviser(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<db::advisers::Adviser>> {
    require_user(&state, &headers).await?;

    let adviser = db::advisers::load_adviser(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Adviser {}", guid)))?;

    Ok(Json(adviser))
}

/// PUT /api/advisers/:guid
pub async fn update_adviser(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<AdviserRequest>,
) -> ApiResult<Json<db::advisers::Adviser>> {
    require_user(&state, &headers).await?;
    validate(&payload)?;

    let adviser = db::advisers::Adviser {
        guid,
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: payload.email,
        quality: payload.quality,
        phone: payload.phone,
        notes: payload.notes,
    };

    let updated = db::advisers::update_adviser(&state.db, &adviser).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict("An adviser with that email already exists".to_string())
        } else {
            e.into()
        }
    })?;

    if !updated {
        return Err(ApiError::NotFound(format!("Adviser {}", guid)));
    }

    Ok(Json(adviser))
}

/// DELETE /api/advisers/:guid
pub async fn delete_adviser(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;

    let deleted = db::advisers::delete_adviser(&state.db, guid).await.map_err(|e| {
        if db::is_fk_violation(&e) {
            ApiError::Conflict("Adviser is referenced by panels or scores".to_string())
        } else {
            e.into()
        }
    })?;

    if !deleted {
        return Err(ApiError::NotFound(format!("Adviser {}", guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Build adviser routes
pub fn adviser_routes() -> Router<AppState> {
    Router::new()
        .route("/api/advisers", get(list_advisers).post(create_adviser))
        .route(
            "/api/advisers/:guid",
            get(get_adviser).put(update_adviser).delete(delete_adviser),
        )
}
