//! Candidate compliance record database operations
//!
//! Each record is one item on the pre-panel checklist for a candidate
//! (references received, safeguarding training, medical form and so on),
//! unique per (candidate, record_type).

use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub const RECORD_STATUSES: &[&str] = &["pending", "received", "verified"];

/// Compliance checklist row
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRecord {
    pub guid: Uuid,
    pub candidate_guid: Uuid,
    pub record_type: String,
    pub status: String,
    pub completed_at: Option<String>,
    pub notes: Option<String>,
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<CandidateRecord> {
    let guid_str: String = row.get("guid");
    let candidate_str: String = row.get("candidate_guid");

    Ok(CandidateRecord {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad record guid: {}", e)))?,
        candidate_guid: Uuid::parse_str(&candidate_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad candidate guid: {}", e)))?,
        record_type: row.get("record_type"),
        status: row.get("status"),
        completed_at: row.get("completed_at"),
        notes: row.get("notes"),
    })
}

pub async fn list_for_candidate(
    pool: &SqlitePool,
    candidate_guid: Uuid,
) -> Result<Vec<CandidateRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, candidate_guid, record_type, status, completed_at, notes
        FROM candidate_records
        WHERE candidate_guid = ?
        ORDER BY record_type
        "#,
    )
    .bind(candidate_guid.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_record).collect()
}

/// Upsert on the unique (candidate, record_type) pair
///
/// A verified or received status stamps completed_at; pending clears it.
pub async fn upsert_record<'e, E>(
    executor: E,
    record: &CandidateRecord,
) -> std::result::Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO candidate_records (guid, candidate_guid, record_type, status, completed_at, notes)
        VALUES (?, ?, ?, ?,
                CASE WHEN ? != 'pending' THEN CURRENT_TIMESTAMP ELSE NULL END,
                ?)
        ON CONFLICT(candidate_guid, record_type) DO UPDATE SET
            status = excluded.status,
            completed_at = CASE WHEN excluded.status != 'pending'
                                THEN COALESCE(completed_at, CURRENT_TIMESTAMP)
                                ELSE NULL END,
            notes = COALESCE(excluded.notes, notes),
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(record.guid.to_string())
    .bind(record.candidate_guid.to_string())
    .bind(&record.record_type)
    .bind(&record.status)
    .bind(&record.status)
    .bind(&record.notes)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn delete_record(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM candidate_records WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
