//! Import history database operations

use chrono::{DateTime, Utc};
use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// One completed import run
#[derive(Debug, Clone, Serialize)]
pub struct ImportRun {
    pub guid: Uuid,
    pub filename: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub processed: i64,
    pub successful: i64,
    pub failed: i64,
    pub skipped: i64,
    pub errors: serde_json::Value,
    pub imported_by: Option<String>,
}

pub async fn insert_run(pool: &SqlitePool, run: &ImportRun) -> Result<()> {
    let errors = serde_json::to_string(&run.errors)
        .map_err(|e| paneltrack_common::Error::Internal(format!("Serialize errors: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO import_history
            (guid, filename, started_at, ended_at, processed, successful, failed, skipped, errors, imported_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(run.guid.to_string())
    .bind(&run.filename)
    .bind(run.started_at.to_rfc3339())
    .bind(run.ended_at.map(|dt| dt.to_rfc3339()))
    .bind(run.processed)
    .bind(run.successful)
    .bind(run.failed)
    .bind(run.skipped)
    .bind(&errors)
    .bind(&run.imported_by)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent runs, newest first
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<ImportRun>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, filename, started_at, ended_at, processed, successful, failed, skipped, errors, imported_by
        FROM import_history
        ORDER BY started_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let guid_str: String = row.get("guid");
            let started_str: String = row.get("started_at");
            let ended_str: Option<String> = row.get("ended_at");
            let errors_str: String = row.get("errors");

            let started_at = DateTime::parse_from_rfc3339(&started_str)
                .map_err(|e| paneltrack_common::Error::Internal(format!("Bad started_at: {}", e)))?
                .with_timezone(&Utc);
            let ended_at = ended_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .map_err(|e| paneltrack_common::Error::Internal(format!("Bad ended_at: {}", e)))?
                .map(|dt| dt.with_timezone(&Utc));

            Ok(ImportRun {
                guid: Uuid::parse_str(&guid_str).map_err(|e| {
                    paneltrack_common::Error::Internal(format!("Bad run guid: {}", e))
                })?,
                filename: row.get("filename"),
                started_at,
                ended_at,
                processed: row.get("processed"),
                successful: row.get("successful"),
                failed: row.get("failed"),
                skipped: row.get("skipped"),
                errors: serde_json::from_str(&errors_str).unwrap_or(serde_json::Value::Null),
                imported_by: row.get("imported_by"),
            })
        })
        .collect()
}
