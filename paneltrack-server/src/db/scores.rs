//! Adviser-to-candidate score database operations
//!
//! One score per adviser/candidate/subject/panel tuple; re-submitting
//! replaces the previous value.

use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Score record
#[derive(Debug, Clone, Serialize)]
pub struct Score {
    pub guid: Uuid,
    pub panel_guid: Uuid,
    pub adviser_guid: Uuid,
    pub candidate_guid: Uuid,
    pub subject: String,
    pub score: i64,
    pub notes: Option<String>,
}

fn row_to_score(row: &sqlx::sqlite::SqliteRow) -> Result<Score> {
    let parse = |col: &str| -> Result<Uuid> {
        let s: String = row.get(col);
        Uuid::parse_str(&s)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad {} guid: {}", col, e)))
    };

    Ok(Score {
        guid: parse("guid")?,
        panel_guid: parse("panel_guid")?,
        adviser_guid: parse("adviser_guid")?,
        candidate_guid: parse("candidate_guid")?,
        subject: row.get("subject"),
        score: row.get("score"),
        notes: row.get("notes"),
    })
}

const SCORE_COLUMNS: &str =
    "guid, panel_guid, adviser_guid, candidate_guid, subject, score, notes";

pub async fn list_for_panel(pool: &SqlitePool, panel_guid: Uuid) -> Result<Vec<Score>> {
    let sql = format!(
        "SELECT {SCORE_COLUMNS} FROM adviser_candidate_scores WHERE panel_guid = ? ORDER BY candidate_guid, subject"
    );
    let rows = sqlx::query(&sql)
        .bind(panel_guid.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_score).collect()
}

pub async fn list_for_candidate(pool: &SqlitePool, candidate_guid: Uuid) -> Result<Vec<Score>> {
    let sql = format!(
        "SELECT {SCORE_COLUMNS} FROM adviser_candidate_scores WHERE candidate_guid = ? ORDER BY panel_guid, subject"
    );
    let rows = sqlx::query(&sql)
        .bind(candidate_guid.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_score).collect()
}

/// Upsert on the unique adviser/candidate/subject/panel tuple
pub async fn upsert_score<'e, E>(executor: E, score: &Score) -> std::result::Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO adviser_candidate_scores
            (guid, panel_guid, adviser_guid, candidate_guid, subject, score, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(panel_guid, adviser_guid, candidate_guid, subject) DO UPDATE SET
            score = excluded.score,
            notes = excluded.notes,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(score.guid.to_string())
    .bind(score.panel_guid.to_string())
    .bind(score.adviser_guid.to_string())
    .bind(score.candidate_guid.to_string())
    .bind(&score.subject)
    .bind(score.score)
    .bind(&score.notes)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn delete_score(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM adviser_candidate_scores WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_pool() -> (SqlitePool, Uuid, Uuid, Uuid) {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await.unwrap();
        paneltrack_common::db::init::create_all_tables(&pool).await.unwrap();

        let panel = Uuid::new_v4();
        let adviser = Uuid::new_v4();
        let candidate = Uuid::new_v4();

        sqlx::query("INSERT INTO panels (guid, name, panel_type, start_date, end_date) VALUES (?, 'P', 'panel', '2026-03-02', '2026-03-04')")
            .bind(panel.to_string())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO advisers (guid, first_name, last_name) VALUES (?, 'Joan', 'Reid')")
            .bind(adviser.to_string())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO candidates (guid, first_name, last_name) VALUES (?, 'Sam', 'Price')")
            .bind(candidate.to_string())
            .execute(&pool)
            .await
            .unwrap();

        (pool, panel, adviser, candidate)
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_score() {
        let (pool, panel, adviser, candidate) = seeded_pool().await;

        let mut score = Score {
            guid: Uuid::new_v4(),
            panel_guid: panel,
            adviser_guid: adviser,
            candidate_guid: candidate,
            subject: "Vocation".to_string(),
            score: 4,
            notes: None,
        };
        upsert_score(&pool, &score).await.unwrap();

        score.guid = Uuid::new_v4();
        score.score = 6;
        upsert_score(&pool, &score).await.unwrap();

        let scores = list_for_panel(&pool, panel).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 6);
    }
}
