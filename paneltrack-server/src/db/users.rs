//! User account database operations

use paneltrack_common::auth::{generate_salt, hash_password};
use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// User account (credentials never leave this module)
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub guid: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,
}

/// Credentials row used by the login handler
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub guid: Uuid,
    pub username: String,
    pub password_hash: String,
    pub password_salt: String,
    pub role: String,
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let guid_str: String = row.get("guid");
    Ok(User {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad user guid: {}", e)))?,
        username: row.get("username"),
        display_name: row.get("display_name"),
        role: row.get("role"),
    })
}

/// List all users ordered by username
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT guid, username, display_name, role FROM users ORDER BY username")
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_user).collect()
}

/// Load user by guid
pub async fn load_user(pool: &SqlitePool, guid: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT guid, username, display_name, role FROM users WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_user).transpose()
}

/// Load credentials by username (login path)
pub async fn load_credentials(pool: &SqlitePool, username: &str) -> Result<Option<UserCredentials>> {
    let row = sqlx::query(
        "SELECT guid, username, password_hash, password_salt, role FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            Ok(Some(UserCredentials {
                guid: Uuid::parse_str(&guid_str).map_err(|e| {
                    paneltrack_common::Error::Internal(format!("Bad user guid: {}", e))
                })?,
                username: row.get("username"),
                password_hash: row.get("password_hash"),
                password_salt: row.get("password_salt"),
                role: row.get("role"),
            }))
        }
        None => Ok(None),
    }
}

/// Create a user with a fresh salt
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    display_name: &str,
    role: &str,
) -> Result<User> {
    let guid = Uuid::new_v4();
    let salt = generate_salt();
    let hash = hash_password(password, &salt);

    sqlx::query(
        r#"
        INSERT INTO users (guid, username, password_hash, password_salt, display_name, role)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(username)
    .bind(&hash)
    .bind(&salt)
    .bind(display_name)
    .bind(role)
    .execute(pool)
    .await?;

    Ok(User {
        guid,
        username: username.to_string(),
        display_name: display_name.to_string(),
        role: role.to_string(),
    })
}

/// Update display name and role
pub async fn update_user(
    pool: &SqlitePool,
    guid: Uuid,
    display_name: &str,
    role: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET display_name = ?, role = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(display_name)
    .bind(role)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Re-salt and re-hash the password
pub async fn set_password(pool: &SqlitePool, guid: Uuid, password: &str) -> Result<bool> {
    let salt = generate_salt();
    let hash = hash_password(password, &salt);

    let result = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?, password_salt = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&hash)
    .bind(&salt)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a user; sessions go with it via ON DELETE CASCADE
pub async fn delete_user(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
