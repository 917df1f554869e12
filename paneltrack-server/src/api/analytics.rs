//! Analytics endpoints
//!
//! Hand-written SQL aggregations over the scheduling tables. All
//! endpoints return zeroed shapes on an empty database.

use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use serde::Serialize;
use sqlx::Row;

use crate::auth::require_user;
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct CountByKey {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub panels_by_type: Vec<CountByKey>,
    pub panels_by_status: Vec<CountByKey>,
    pub candidates: i64,
    pub advisers: i64,
    pub upcoming_panels: i64,
}

#[derive(Debug, Serialize)]
pub struct PanelSubjectAverage {
    pub panel_name: String,
    pub subject: String,
    pub average_score: f64,
    pub score_count: i64,
}

#[derive(Debug, Serialize)]
pub struct AdviserSpread {
    pub adviser_name: String,
    pub quality: Option<String>,
    pub mean_score: f64,
    pub min_score: i64,
    pub max_score: i64,
    pub score_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ScoresResponse {
    pub panel_subject_averages: Vec<PanelSubjectAverage>,
    pub adviser_spreads: Vec<AdviserSpread>,
}

#[derive(Debug, Serialize)]
pub struct PanelTaskStats {
    pub panel_name: String,
    pub total: i64,
    pub done: i64,
    pub completion_rate: f64,
    pub overdue: i64,
}

#[derive(Debug, Serialize)]
pub struct CandidateProgress {
    pub candidate_name: String,
    pub total_records: i64,
    pub verified_records: i64,
    pub completion_rate: f64,
}

/// GET /api/analytics/overview
pub async fn overview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<OverviewResponse>> {
    require_user(&state, &headers).await?;
    let db = &state.db;

    let by_type = sqlx::query("SELECT panel_type AS key, COUNT(*) AS count FROM panels GROUP BY panel_type ORDER BY panel_type")
        .fetch_all(db)
        .await
        .map_err(paneltrack_common::Error::Database)?;
    let by_status = sqlx::query("SELECT status AS key, COUNT(*) AS count FROM panels GROUP BY status ORDER BY status")
        .fetch_all(db)
        .await
        .map_err(paneltrack_common::Error::Database)?;

    let candidates: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates")
        .fetch_one(db)
        .await
        .map_err(paneltrack_common::Error::Database)?;
    let advisers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM advisers")
        .fetch_one(db)
        .await
        .map_err(paneltrack_common::Error::Database)?;

    let window_days: i64 = sqlx::query_scalar(
        "SELECT CAST(value AS INTEGER) FROM settings WHERE key = 'upcoming_window_days'",
    )
    .fetch_optional(db)
    .await
    .map_err(paneltrack_common::Error::Database)?
    .unwrap_or(60);

    let upcoming_panels: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM panels
        WHERE status != 'cancelled'
          AND start_date >= date('now')
          AND start_date <= date('now', '+' || ? || ' days')
        "#,
    )
    .bind(window_days)
    .fetch_one(db)
    .await
    .map_err(paneltrack_common::Error::Database)?;

    let to_counts = |rows: Vec<sqlx::sqlite::SqliteRow>| {
        rows.iter()
            .map(|row| CountByKey {
                key: row.get("key"),
                count: row.get("count"),
            })
            .collect()
    };

    Ok(Json(OverviewResponse {
        panels_by_type: to_counts(by_type),
        panels_by_status: to_counts(by_status),
        candidates,
        advisers,
        upcoming_panels,
    }))
}

/// GET /api/analytics/scores
pub async fn scores(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ScoresResponse>> {
    require_user(&state, &headers).await?;
    let db = &state.db;

    let averages = sqlx::query(
        r#"
        SELECT p.name AS panel_name, s.subject,
               AVG(s.score) AS average_score,
               COUNT(*) AS score_count
        FROM adviser_candidate_scores s
        JOIN panels p ON p.guid = s.panel_guid
        GROUP BY s.panel_guid, s.subject
        ORDER BY p.start_date, s.subject
        "#,
    )
    .fetch_all(db)
    .await
    .map_err(paneltrack_common::Error::Database)?;

    let spreads = sqlx::query(
        r#"
        SELECT a.first_name || ' ' || a.last_name AS adviser_name,
               a.quality,
               AVG(s.score) AS mean_score,
               MIN(s.score) AS min_score,
               MAX(s.score) AS max_score,
               COUNT(*) AS score_count
        FROM adviser_candidate_scores s
        JOIN advisers a ON a.guid = s.adviser_guid
        GROUP BY s.adviser_guid
        ORDER BY adviser_name
        "#,
    )
    .fetch_all(db)
    .await
    .map_err(paneltrack_common::Error::Database)?;

    Ok(Json(ScoresResponse {
        panel_subject_averages: averages
            .iter()
            .map(|row| PanelSubjectAverage {
                panel_name: row.get("panel_name"),
                subject: row.get("subject"),
                average_score: row.get("average_score"),
                score_count: row.get("score_count"),
            })
            .collect(),
        adviser_spreads: spreads
            .iter()
            .map(|row| AdviserSpread {
                adviser_name: row.get("adviser_name"),
                quality: row.get("quality"),
                mean_score: row.get("mean_score"),
                min_score: row.get("min_score"),
                max_score: row.get("max_score"),
                score_count: row.get("score_count"),
            })
            .collect(),
    }))
}

/// GET /api/analytics/tasks
pub async fn tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PanelTaskStats>>> {
    require_user(&state, &headers).await?;

    let rows = sqlx::query(
        r#"
        SELECT p.name AS panel_name,
               COUNT(t.guid) AS total,
               SUM(CASE WHEN t.status = 'done' THEN 1 ELSE 0 END) AS done,
               SUM(CASE WHEN t.status != 'done'
                         AND t.due_date IS NOT NULL
                         AND t.due_date < date('now') THEN 1 ELSE 0 END) AS overdue
        FROM panels p
        LEFT JOIN tasks t ON t.panel_guid = p.guid
        GROUP BY p.guid
        ORDER BY p.start_date DESC
        "#,
    )
    .fetch_all(&state.db)
    .await
    .map_err(paneltrack_common::Error::Database)?;

    let stats = rows
        .iter()
        .map(|row| {
            let total: i64 = row.get("total");
            let done: i64 = row.get::<Option<i64>, _>("done").unwrap_or(0);
            let overdue: i64 = row.get::<Option<i64>, _>("overdue").unwrap_or(0);
            PanelTaskStats {
                panel_name: row.get("panel_name"),
                total,
                done,
                completion_rate: if total > 0 {
                    done as f64 / total as f64
                } else {
                    0.0
                },
                overdue,
            }
        })
        .collect();

    Ok(Json(stats))
}

/// GET /api/analytics/candidates
pub async fn candidates(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<CandidateProgress>>> {
    require_user(&state, &headers).await?;

    let rows = sqlx::query(
        r#"
        SELECT c.first_name || ' ' || c.last_name AS candidate_name,
               COUNT(r.guid) AS total_records,
               SUM(CASE WHEN r.status = 'verified' THEN 1 ELSE 0 END) AS verified_records
        FROM candidates c
        LEFT JOIN candidate_records r ON r.candidate_guid = c.guid
        GROUP BY c.guid
        ORDER BY c.last_name, c.first_name
        "#,
    )
    .fetch_all(&state.db)
    .await
    .map_err(paneltrack_common::Error::Database)?;

    let progress = rows
        .iter()
        .map(|row| {
            let total: i64 = row.get("total_records");
            let verified: i64 = row.get::<Option<i64>, _>("verified_records").unwrap_or(0);
            CandidateProgress {
                candidate_name: row.get("candidate_name"),
                total_records: total,
                verified_records: verified,
                completion_rate: if total > 0 {
                    verified as f64 / total as f64
                } else {
                    0.0
                },
            }
        })
        .collect();

    Ok(Json(progress))
}

/// Build analytics routes
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/overview", get(overview))
        .route("/api/analytics/scores", get(scores))
        .route("/api/analytics/tasks", get(tasks))
        .route("/api/analytics/candidates", get(candidates))
}
