//! Session table operations
//!
//! Sessions are the server-side half of authentication: a cookie token
//! is only honored while its row is present and unexpired.

use chrono::{DateTime, Duration, Utc};
use paneltrack_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Server-side session row
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_guid: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Read the configured session lifetime (hours) from settings
pub async fn session_ttl_hours(pool: &SqlitePool) -> Result<i64> {
    let ttl: Option<i64> = sqlx::query_scalar(
        "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'session_ttl_hours'",
    )
    .fetch_optional(pool)
    .await?;

    Ok(ttl.unwrap_or(24))
}

/// Create a session for the user and return it
pub async fn create_session(pool: &SqlitePool, user_guid: Uuid, ttl_hours: i64) -> Result<Session> {
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::hours(ttl_hours);

    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_guid, expires_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&token)
    .bind(user_guid.to_string())
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(Session {
        token,
        user_guid,
        expires_at,
    })
}

/// Load a session by token
pub async fn load_session(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    let row = sqlx::query("SELECT token, user_guid, expires_at FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let user_guid_str: String = row.get("user_guid");
            let expires_str: String = row.get("expires_at");

            let user_guid = Uuid::parse_str(&user_guid_str).map_err(|e| {
                paneltrack_common::Error::Internal(format!("Bad session user guid: {}", e))
            })?;
            let expires_at = DateTime::parse_from_rfc3339(&expires_str)
                .map_err(|e| {
                    paneltrack_common::Error::Internal(format!("Bad session expiry: {}", e))
                })?
                .with_timezone(&Utc);

            Ok(Some(Session {
                token: row.get("token"),
                user_guid,
                expires_at,
            }))
        }
        None => Ok(None),
    }
}

/// Stamp last_seen_at
pub async fn touch_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("UPDATE sessions SET last_seen_at = CURRENT_TIMESTAMP WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a session (logout)
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

/// Remove expired sessions; returns how many were dropped
pub async fn delete_expired_sessions(pool: &SqlitePool) -> Result<usize> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await.unwrap();
        paneltrack_common::db::init::create_all_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let pool = test_pool().await;
        let user = crate::db::users::create_user(&pool, "u", "pw", "", "user")
            .await
            .unwrap();

        let session = create_session(&pool, user.guid, 24).await.unwrap();
        let loaded = load_session(&pool, &session.token).await.unwrap().unwrap();
        assert_eq!(loaded.user_guid, user.guid);
        assert!(loaded.expires_at > Utc::now());

        delete_session(&pool, &session.token).await.unwrap();
        assert!(load_session(&pool, &session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_cleanup() {
        let pool = test_pool().await;
        let user = crate::db::users::create_user(&pool, "u", "pw", "", "user")
            .await
            .unwrap();

        // Already expired
        create_session(&pool, user.guid, -1).await.unwrap();
        let dropped = delete_expired_sessions(&pool).await.unwrap();
        assert_eq!(dropped, 1);
    }
}
