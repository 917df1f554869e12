//! Adviser database operations
//!
//! Each adviser carries a "quality": the assessment subject they are
//! assigned to examine (e.g. Vocation, Ministry, Spirituality).

use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Adviser record
#[derive(Debug, Clone, Serialize)]
pub struct Adviser {
    pub guid: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub quality: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

const ADVISER_COLUMNS: &str = "guid, first_name, last_name, email, quality, phone, notes";

fn row_to_adviser(row: &sqlx::sqlite::SqliteRow) -> Result<Adviser> {
    let guid_str: String = row.get("guid");
    Ok(Adviser {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad adviser guid: {}", e)))?,
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        quality: row.get("quality"),
        phone: row.get("phone"),
        notes: row.get("notes"),
    })
}

pub async fn list_advisers(pool: &SqlitePool) -> Result<Vec<Adviser>> {
    let sql = format!("SELECT {ADVISER_COLUMNS} FROM advisers ORDER BY last_name, first_name");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(row_to_adviser).collect()
}

pub async fn load_adviser(pool: &SqlitePool, guid: Uuid) -> Result<Option<Adviser>> {
    let sql = format!("SELECT {ADVISER_COLUMNS} FROM advisers WHERE guid = ?");
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_adviser).transpose()
}

/// Find an adviser guid by email (import path)
pub async fn find_adviser_by_email(
    executor: &mut sqlx::SqliteConnection,
    email: &str,
) -> std::result::Result<Option<Uuid>, sqlx::Error> {
    let row = sqlx::query("SELECT guid FROM advisers WHERE email = ?")
        .bind(email)
        .fetch_optional(executor)
        .await?;

    Ok(row.and_then(|r| {
        let guid: String = r.get("guid");
        Uuid::parse_str(&guid).ok()
    }))
}

pub async fn create_adviser(pool: &SqlitePool, adviser: &Adviser) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO advisers (guid, first_name, last_name, email, quality, phone, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(adviser.guid.to_string())
    .bind(&adviser.first_name)
    .bind(&adviser.last_name)
    .bind(&adviser.email)
    .bind(&adviser.quality)
    .bind(&adviser.phone)
    .bind(&adviser.notes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_adviser(pool: &SqlitePool, adviser: &Adviser) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE advisers
        SET first_name = ?, last_name = ?, email = ?, quality = ?, phone = ?,
            notes = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&adviser.first_name)
    .bind(&adviser.last_name)
    .bind(&adviser.email)
    .bind(&adviser.quality)
    .bind(&adviser.phone)
    .bind(&adviser.notes)
    .bind(adviser.guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_adviser(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM advisers WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Upsert by unique email; rows without an email always insert fresh
/// (import path)
pub async fn upsert_adviser_by_email(
    executor: &mut sqlx::SqliteConnection,
    adviser: &Adviser,
) -> std::result::Result<(), sqlx::Error> {
    if adviser.email.is_some() {
        sqlx::query(
            r#"
            INSERT INTO advisers (guid, first_name, last_name, email, quality, phone, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                quality = COALESCE(excluded.quality, quality),
                phone = COALESCE(excluded.phone, phone),
                notes = COALESCE(excluded.notes, notes),
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(adviser.guid.to_string())
        .bind(&adviser.first_name)
        .bind(&adviser.last_name)
        .bind(&adviser.email)
        .bind(&adviser.quality)
        .bind(&adviser.phone)
        .bind(&adviser.notes)
        .execute(executor)
        .await?;
    } else {
        sqlx::query(
            r#"
            INSERT INTO advisers (guid, first_name, last_name, quality, phone, notes)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(adviser.guid.to_string())
        .bind(&adviser.first_name)
        .bind(&adviser.last_name)
        .bind(&adviser.quality)
        .bind(&adviser.phone)
        .bind(&adviser.notes)
        .execute(executor)
        .await?;
    }

    Ok(())
}
