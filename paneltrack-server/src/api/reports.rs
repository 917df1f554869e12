//! Report endpoints
//!
//! Read-only joins over the scheduling tables: panel rosters, the
//! printing checklist with outstanding counts, and per-candidate
//! summaries.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::Row;
use uuid::Uuid;

use crate::auth::require_user;
use crate::db;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub panel: db::panels::Panel,
    pub candidates: Vec<db::attendees::AttendeeDetail>,
    pub advisers: Vec<db::attendees::AttendeeDetail>,
    pub secretaries: Vec<db::attendees::AttendeeDetail>,
}

#[derive(Debug, Serialize)]
pub struct PrintChecklistResponse {
    pub panel: db::panels::Panel,
    pub items: Vec<db::print_items::PrintItem>,
    pub total: usize,
    pub printed: usize,
    pub outstanding: usize,
}

#[derive(Debug, Serialize)]
pub struct CandidateScoreRow {
    pub panel_name: String,
    pub adviser_name: String,
    pub subject: String,
    pub score: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidateSummaryResponse {
    pub candidate: db::candidates::Candidate,
    pub records: Vec<db::candidate_records::CandidateRecord>,
    pub scores: Vec<CandidateScoreRow>,
}

/// GET /api/reports/panels/:guid/roster
pub async fn panel_roster(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<RosterResponse>> {
    require_user(&state, &headers).await?;

    let panel = db::panels::load_panel(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Panel {}", guid)))?;

    let attendees = db::attendees::list_for_panel(&state.db, guid).await?;

    let mut response = RosterResponse {
        panel,
        candidates: Vec::new(),
        advisers: Vec::new(),
        secretaries: Vec::new(),
    };
    for detail in attendees {
        match detail.attendee.attendee_type.as_str() {
            "candidate" => response.candidates.push(detail),
            "adviser" => response.advisers.push(detail),
            _ => response.secretaries.push(detail),
        }
    }

    Ok(Json(response))
}

/// GET /api/reports/panels/:guid/print-checklist
pub async fn print_checklist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<PrintChecklistResponse>> {
    require_user(&state, &headers).await?;

    let panel = db::panels::load_panel(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Panel {}", guid)))?;

    let items = db::print_items::list_for_panel(&state.db, guid).await?;
    let total = items.len();
    let printed = items.iter().filter(|i| i.printed).count();

    Ok(Json(PrintChecklistResponse {
        panel,
        total,
        printed,
        outstanding: total - printed,
        items,
    }))
}

/// GET /api/reports/candidates/:guid/summary
pub async fn candidate_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<CandidateSummaryResponse>> {
    require_user(&state, &headers).await?;

    let candidate = db::candidates::load_candidate(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Candidate {}", guid)))?;

    let records = db::candidate_records::list_for_candidate(&state.db, guid).await?;

    let rows = sqlx::query(
        r#"
        SELECT p.name AS panel_name,
               a.first_name || ' ' || a.last_name AS adviser_name,
               s.subject, s.score, s.notes
        FROM adviser_candidate_scores s
        JOIN panels p ON p.guid = s.panel_guid
        JOIN advisers a ON a.guid = s.adviser_guid
        WHERE s.candidate_guid = ?
        ORDER BY p.start_date, s.subject
        "#,
    )
    .bind(guid.to_string())
    .fetch_all(&state.db)
    .await
    .map_err(paneltrack_common::Error::Database)?;

    let scores = rows
        .iter()
        .map(|row| CandidateScoreRow {
            panel_name: row.get("panel_name"),
            adviser_name: row.get("adviser_name"),
            subject: row.get("subject"),
            score: row.get("score"),
            notes: row.get("notes"),
        })
        .collect();

    Ok(Json(CandidateSummaryResponse {
        candidate,
        records,
        scores,
    }))
}

/// Build report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reports/panels/:guid/roster", get(panel_roster))
        .route(
            "/api/reports/panels/:guid/print-checklist",
            get(print_checklist),
        )
        .route(
            "/api/reports/candidates/:guid/summary",
            get(candidate_summary),
        )
}
