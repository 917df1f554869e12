//! Authentication endpoints
//!
//! Login verifies the salted password hash, opens a sessions row, and
//! sets an HttpOnly cookie holding a signed token. Logout deletes the
//! sessions row so the token dies immediately.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{self, Claims};
use crate::db;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub guid: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
}

/// POST /api/auth/login
///
/// Unknown usernames and wrong passwords both answer 401 without
/// distinguishing which was wrong.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let creds = db::users::load_credentials(&state.db, &payload.username)
        .await?
        .ok_or_else(invalid)?;

    if !paneltrack_common::auth::verify_password(
        &payload.password,
        &creds.password_salt,
        &creds.password_hash,
    ) {
        return Err(invalid());
    }

    let ttl_hours = db::sessions::session_ttl_hours(&state.db).await?;
    let session = db::sessions::create_session(&state.db, creds.guid, ttl_hours).await?;

    let secret = paneltrack_common::auth::load_token_secret(&state.db).await?;
    let claims = Claims {
        sub: creds.guid.to_string(),
        sid: session.token.clone(),
        role: creds.role.clone(),
        exp: session.expires_at.timestamp(),
    };
    let token = auth::encode_token(&secret, &claims)?;

    info!("User {} logged in", creds.username);

    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let user = db::users::load_user(&state.db, creds.guid)
        .await?
        .ok_or_else(invalid)?;

    let body = Json(LoginResponse {
        guid: user.guid.to_string(),
        username: user.username,
        display_name: user.display_name,
        role: user.role,
    });

    Ok((
        [(
            header::SET_COOKIE,
            auth::session_cookie(&token, max_age),
        )],
        body,
    )
        .into_response())
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    // A missing or bad cookie still clears the client side
    if let Ok(user) = auth::require_user(&state, &headers).await {
        db::sessions::delete_session(&state.db, &user.session_token).await?;
        info!("User {} logged out", user.username);
    }

    Ok((
        [(header::SET_COOKIE, auth::clear_session_cookie())],
        Json(serde_json::json!({ "success": true })),
    )
        .into_response())
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<LoginResponse>> {
    let user = auth::require_user(&state, &headers).await?;

    Ok(Json(LoginResponse {
        guid: user.guid.to_string(),
        username: user.username,
        display_name: user.display_name,
        role: user.role,
    }))
}

/// Build auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}
