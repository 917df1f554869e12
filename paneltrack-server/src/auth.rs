//! Cookie session handling and route guards
//!
//! The login endpoint issues a JWT carried in an HttpOnly cookie. The
//! token is only half the story: its `sid` claim must still match a live
//! row in the sessions table, so logout (or deleting a user) revokes
//! access immediately regardless of the token's expiry.

use axum::http::HeaderMap;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::{ApiError, ApiResult, AppState};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "paneltrack_session";

/// JWT claims carried by the session cookie
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User guid
    pub sub: String,
    /// Session token (primary key of the sessions row)
    pub sid: String,
    /// Role at time of issue; re-checked against the users table
    pub role: String,
    /// Expiry as Unix seconds
    pub exp: i64,
}

/// The authenticated caller, resolved from cookie + sessions + users
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub guid: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub session_token: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Encode a session JWT
pub fn encode_token(secret: &str, claims: &Claims) -> ApiResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to encode token: {}", e)))
}

/// Decode and validate a session JWT (signature + expiry)
pub fn decode_token(secret: &str, token: &str) -> ApiResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Invalid or expired session token".to_string()))
}

/// Build the Set-Cookie value for a fresh session
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// Build the Set-Cookie value that clears the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Extract a named cookie from the Cookie header
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    for pair in header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        if key == name {
            return parts.next().map(|v| v.trim().to_string());
        }
    }

    None
}

/// Resolve the authenticated user or reject with 401
///
/// Validates the cookie JWT, then requires a live (unexpired) sessions
/// row and an existing user.
pub async fn require_user(state: &AppState, headers: &HeaderMap) -> ApiResult<CurrentUser> {
    let token = extract_cookie(headers, SESSION_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("Missing session cookie".to_string()))?;

    let secret = paneltrack_common::auth::load_token_secret(&state.db).await?;
    let claims = decode_token(&secret, &token)?;

    let session = db::sessions::load_session(&state.db, &claims.sid)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session has been revoked".to_string()))?;

    if session.expires_at <= Utc::now() {
        return Err(ApiError::Unauthorized("Session has expired".to_string()));
    }

    let user_guid = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Malformed session token".to_string()))?;

    let user = db::users::load_user(&state.db, user_guid)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    db::sessions::touch_session(&state.db, &claims.sid).await?;

    Ok(CurrentUser {
        guid: user.guid,
        username: user.username,
        display_name: user.display_name,
        role: user.role,
        session_token: claims.sid,
    })
}

/// Resolve the authenticated user and require the admin role
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> ApiResult<CurrentUser> {
    let user = require_user(state, headers).await?;
    if !user.is_admin() {
        return Err(ApiError::Forbidden("Admin role required".to_string()));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn test_extract_cookie_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "other=1; paneltrack_session=abc.def.ghi; trailing=x"
                .parse()
                .unwrap(),
        );

        assert_eq!(
            extract_cookie(&headers, SESSION_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_token_round_trip() {
        let claims = Claims {
            sub: "3e9bb2a0-0000-0000-0000-000000000001".to_string(),
            sid: "session-token".to_string(),
            role: "admin".to_string(),
            exp: Utc::now().timestamp() + 3600,
        };

        let token = encode_token("secret", &claims).unwrap();
        let decoded = decode_token("secret", &token).unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.sid, claims.sid);
        assert_eq!(decoded.role, "admin");

        // Wrong secret is rejected
        assert!(decode_token("other-secret", &token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            sub: "u".to_string(),
            sid: "s".to_string(),
            role: "user".to_string(),
            exp: Utc::now().timestamp() - 120,
        };

        let token = encode_token("secret", &claims).unwrap();
        assert!(decode_token("secret", &token).is_err());
    }
}
