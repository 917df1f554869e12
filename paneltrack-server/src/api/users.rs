//! User administration endpoints (admin only)

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::require_admin;
use crate::db;
use crate::{ApiError, ApiResult, AppState};

const ROLES: &[&str] = &["admin", "user"];

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub password: String,
}

fn validate_role(role: &str) -> ApiResult<()> {
    if !ROLES.contains(&role) {
        return Err(ApiError::BadRequest(format!("Unknown role '{}'", role)));
    }
    Ok(())
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<db::users::User>>> {
    require_admin(&state, &headers).await?;
    Ok(Json(db::users::list_users(&state.db).await?))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<Json<db::users::User>> {
    require_admin(&state, &headers).await?;

    if payload.username.trim().is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password cannot be empty".to_string()));
    }
    validate_role(&payload.role)?;

    let user = db::users::create_user(
        &state.db,
        payload.username.trim(),
        &payload.password,
        &payload.display_name,
        &payload.role,
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict(format!("Username '{}' already exists", payload.username.trim()))
        } else {
            e.into()
        }
    })?;

    Ok(Json(user))
}

/// GET /api/users/:guid
pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<db::users::User>> {
    require_admin(&state, &headers).await?;

    let user = db::users::load_user(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", guid)))?;

    Ok(Json(user))
}

/// PUT /api/users/:guid
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<db::users::User>> {
    require_admin(&state, &headers).await?;
    validate_role(&payload.role)?;

    let updated = db::users::update_user(&state.db, guid, &payload.display_name, &payload.role).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("User {}", guid)));
    }

    let user = db::users::load_user(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", guid)))?;

    Ok(Json(user))
}

/// PUT /api/users/:guid/password
pub async fn set_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<SetPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&state, &headers).await?;

    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password cannot be empty".to_string()));
    }

    let updated = db::users::set_password(&state.db, guid, &payload.password).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("User {}", guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/users/:guid
pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let caller = require_admin(&state, &headers).await?;

    if caller.guid == guid {
        return Err(ApiError::BadRequest("Cannot delete your own account".to_string()));
    }

    let deleted = db::users::delete_user(&state.db, guid).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("User {}", guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Build user administration routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:guid",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/users/:guid/password", put(set_password))
}
