//! Candidate database operations

use chrono::NaiveDate;
use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Candidate record
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub guid: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub diocese: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
}

const CANDIDATE_COLUMNS: &str =
    "guid, first_name, last_name, email, diocese, phone, date_of_birth, notes";

fn row_to_candidate(row: &sqlx::sqlite::SqliteRow) -> Result<Candidate> {
    let guid_str: String = row.get("guid");
    Ok(Candidate {
        guid: Uuid::parse_str(&guid_str).map_err(|e| {
            paneltrack_common::Error::Internal(format!("Bad candidate guid: {}", e))
        })?,
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        diocese: row.get("diocese"),
        phone: row.get("phone"),
        date_of_birth: row.get("date_of_birth"),
        notes: row.get("notes"),
    })
}

pub async fn list_candidates(pool: &SqlitePool) -> Result<Vec<Candidate>> {
    let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY last_name, first_name");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(row_to_candidate).collect()
}

pub async fn load_candidate(pool: &SqlitePool, guid: Uuid) -> Result<Option<Candidate>> {
    let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE guid = ?");
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_candidate).transpose()
}

/// Find a candidate guid by email (import path)
pub async fn find_candidate_by_email(
    executor: &mut sqlx::SqliteConnection,
    email: &str,
) -> std::result::Result<Option<Uuid>, sqlx::Error> {
    let row = sqlx::query("SELECT guid FROM candidates WHERE email = ?")
        .bind(email)
        .fetch_optional(executor)
        .await?;

    Ok(row.and_then(|r| {
        let guid: String = r.get("guid");
        Uuid::parse_str(&guid).ok()
    }))
}

pub async fn create_candidate(pool: &SqlitePool, candidate: &Candidate) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO candidates (guid, first_name, last_name, email, diocese, phone, date_of_birth, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(candidate.guid.to_string())
    .bind(&candidate.first_name)
    .bind(&candidate.last_name)
    .bind(&candidate.email)
    .bind(&candidate.diocese)
    .bind(&candidate.phone)
    .bind(candidate.date_of_birth)
    .bind(&candidate.notes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_candidate(pool: &SqlitePool, candidate: &Candidate) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE candidates
        SET first_name = ?, last_name = ?, email = ?, diocese = ?, phone = ?,
            date_of_birth = ?, notes = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&candidate.first_name)
    .bind(&candidate.last_name)
    .bind(&candidate.email)
    .bind(&candidate.diocese)
    .bind(&candidate.phone)
    .bind(candidate.date_of_birth)
    .bind(&candidate.notes)
    .bind(candidate.guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_candidate(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM candidates WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Upsert by unique email; rows without an email always insert fresh
/// (import path)
pub async fn upsert_candidate_by_email(
    executor: &mut sqlx::SqliteConnection,
    candidate: &Candidate,
) -> std::result::Result<(), sqlx::Error> {
    if candidate.email.is_some() {
        sqlx::query(
            r#"
            INSERT INTO candidates (guid, first_name, last_name, email, diocese, phone, date_of_birth, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                diocese = COALESCE(excluded.diocese, diocese),
                phone = COALESCE(excluded.phone, phone),
                date_of_birth = COALESCE(excluded.date_of_birth, date_of_birth),
                notes = COALESCE(excluded.notes, notes),
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(candidate.guid.to_string())
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.email)
        .bind(&candidate.diocese)
        .bind(&candidate.phone)
        .bind(candidate.date_of_birth)
        .bind(&candidate.notes)
        .execute(executor)
        .await?;
    } else {
        sqlx::query(
            r#"
            INSERT INTO candidates (guid, first_name, last_name, diocese, phone, date_of_birth, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(candidate.guid.to_string())
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.diocese)
        .bind(&candidate.phone)
        .bind(candidate.date_of_birth)
        .bind(&candidate.notes)
        .execute(executor)
        .await?;
    }

    Ok(())
}
