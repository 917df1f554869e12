//! Panel endpoints: panel CRUD plus the attendee, score, and printing
//! checklist subresources

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::require_user;
use crate::db;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct PanelRequest {
    pub name: String,
    pub panel_type: String,
    pub venue_guid: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_status")]
    pub status: String,
    pub notes: Option<String>,
}

fn default_status() -> String {
    "planned".to_string()
}

#[derive(Debug, Deserialize)]
pub struct PanelFilter {
    pub panel_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttendeeRequest {
    pub attendee_type: String,
    pub candidate_guid: Option<Uuid>,
    pub adviser_guid: Option<Uuid>,
    pub team: Option<String>,
    pub designation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttendeeUpdateRequest {
    pub team: Option<String>,
    pub designation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub adviser_guid: Uuid,
    pub candidate_guid: Uuid,
    pub subject: String,
    pub score: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PrintItemRequest {
    pub item_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub notes: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct PrintItemUpdateRequest {
    pub quantity: i64,
    pub printed: bool,
    pub notes: Option<String>,
}

fn validate_panel(payload: &PanelRequest) -> ApiResult<()> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Panel name cannot be empty".to_string()));
    }
    if !db::panels::PANEL_TYPES.contains(&payload.panel_type.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unknown panel type '{}'",
            payload.panel_type
        )));
    }
    if !db::panels::PANEL_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unknown status '{}'",
            payload.status
        )));
    }
    if payload.end_date < payload.start_date {
        return Err(ApiError::BadRequest(
            "End date cannot be before start date".to_string(),
        ));
    }
    Ok(())
}

async fn panel_or_404(state: &AppState, guid: Uuid) -> ApiResult<db::panels::Panel> {
    db::panels::load_panel(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Panel {}", guid)))
}

// ---- panels ----

/// GET /api/panels?panel_type=&status=
pub async fn list_panels(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<PanelFilter>,
) -> ApiResult<Json<Vec<db::panels::Panel>>> {
    require_user(&state, &headers).await?;

    let panels = db::panels::list_panels(
        &state.db,
        filter.panel_type.as_deref(),
        filter.status.as_deref(),
    )
    .await?;

    Ok(Json(panels))
}

/// POST /api/panels
pub async fn create_panel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PanelRequest>,
) -> ApiResult<Json<db::panels::Panel>> {
    require_user(&state, &headers).await?;
    validate_panel(&payload)?;

    if let Some(venue_guid) = payload.venue_guid {
        if db::venues::load_venue(&state.db, venue_guid).await?.is_none() {
            return Err(ApiError::BadRequest(format!("Unknown venue {}", venue_guid)));
        }
    }

    let panel = db::panels::Panel {
        guid: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        panel_type: payload.panel_type,
        venue_guid: payload.venue_guid,
        start_date: payload.start_date,
        end_date: payload.end_date,
        status: payload.status,
        notes: payload.notes,
    };
    db::panels::create_panel(&state.db, &panel).await?;

    Ok(Json(panel))
}

/// GET /api/panels/:guid
pub async fn get_panel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<db::panels::Panel>> {
    require_user(&state, &headers).await?;
    Ok(Json(panel_or_404(&state, guid).await?))
}

/// PUT /api/panels/:guid
pub async fn update_panel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<PanelRequest>,
) -> ApiResult<Json<db::panels::Panel>> {
    require_user(&state, &headers).await?;
    validate_panel(&payload)?;

    if let Some(venue_guid) = payload.venue_guid {
        if db::venues::load_venue(&state.db, venue_guid).await?.is_none() {
            return Err(ApiError::BadRequest(format!("Unknown venue {}", venue_guid)));
        }
    }

    let panel = db::panels::Panel {
        guid,
        name: payload.name.trim().to_string(),
        panel_type: payload.panel_type,
        venue_guid: payload.venue_guid,
        start_date: payload.start_date,
        end_date: payload.end_date,
        status: payload.status,
        notes: payload.notes,
    };

    let updated = db::panels::update_panel(&state.db, &panel).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("Panel {}", guid)));
    }

    Ok(Json(panel))
}

/// DELETE /api/panels/:guid
pub async fn delete_panel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;

    let deleted = db::panels::delete_panel(&state.db, guid).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Panel {}", guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

// ---- attendees ----

/// GET /api/panels/:guid/attendees
pub async fn list_attendees(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Vec<db::attendees::AttendeeDetail>>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    Ok(Json(db::attendees::list_for_panel(&state.db, guid).await?))
}

/// POST /api/panels/:guid/attendees
pub async fn add_attendee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<AttendeeRequest>,
) -> ApiResult<Json<db::attendees::Attendee>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    if !db::attendees::ATTENDEE_TYPES.contains(&payload.attendee_type.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unknown attendee type '{}'",
            payload.attendee_type
        )));
    }

    match payload.attendee_type.as_str() {
        "candidate" if payload.candidate_guid.is_none() => {
            return Err(ApiError::BadRequest(
                "Candidate attendee requires candidate_guid".to_string(),
            ));
        }
        "adviser" if payload.adviser_guid.is_none() => {
            return Err(ApiError::BadRequest(
                "Adviser attendee requires adviser_guid".to_string(),
            ));
        }
        _ => {}
    }

    if let Some(candidate_guid) = payload.candidate_guid {
        if db::candidates::load_candidate(&state.db, candidate_guid).await?.is_none() {
            return Err(ApiError::NotFound(format!("Candidate {}", candidate_guid)));
        }
    }
    if let Some(adviser_guid) = payload.adviser_guid {
        if db::advisers::load_adviser(&state.db, adviser_guid).await?.is_none() {
            return Err(ApiError::NotFound(format!("Adviser {}", adviser_guid)));
        }
    }

    let attendee = db::attendees::Attendee {
        guid: Uuid::new_v4(),
        panel_guid: guid,
        attendee_type: payload.attendee_type,
        candidate_guid: payload.candidate_guid,
        adviser_guid: payload.adviser_guid,
        team: payload.team,
        designation: payload.designation,
    };

    db::attendees::add_attendee(&state.db, &attendee).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict("Person is already attending this panel".to_string())
        } else {
            e.into()
        }
    })?;

    Ok(Json(attendee))
}

/// PUT /api/panels/:guid/attendees/:attendee_guid
pub async fn update_attendee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((guid, attendee_guid)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AttendeeUpdateRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    let updated = db::attendees::update_attendee(
        &state.db,
        attendee_guid,
        payload.team.as_deref(),
        payload.designation.as_deref(),
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound(format!("Attendee {}", attendee_guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/panels/:guid/attendees/:attendee_guid
pub async fn remove_attendee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((guid, attendee_guid)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    let removed = db::attendees::remove_attendee(&state.db, attendee_guid).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("Attendee {}", attendee_guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

// ---- scores ----

/// GET /api/panels/:guid/scores
pub async fn list_scores(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Vec<db::scores::Score>>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    Ok(Json(db::scores::list_for_panel(&state.db, guid).await?))
}

/// PUT /api/panels/:guid/scores
///
/// Upserts the score for the adviser/candidate/subject tuple.
pub async fn put_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<ScoreRequest>,
) -> ApiResult<Json<db::scores::Score>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    if payload.subject.trim().is_empty() {
        return Err(ApiError::BadRequest("Subject cannot be empty".to_string()));
    }
    if !(1..=7).contains(&payload.score) {
        return Err(ApiError::BadRequest("Score must be between 1 and 7".to_string()));
    }

    if db::advisers::load_adviser(&state.db, payload.adviser_guid).await?.is_none() {
        return Err(ApiError::NotFound(format!("Adviser {}", payload.adviser_guid)));
    }
    if db::candidates::load_candidate(&state.db, payload.candidate_guid).await?.is_none() {
        return Err(ApiError::NotFound(format!("Candidate {}", payload.candidate_guid)));
    }

    let score = db::scores::Score {
        guid: Uuid::new_v4(),
        panel_guid: guid,
        adviser_guid: payload.adviser_guid,
        candidate_guid: payload.candidate_guid,
        subject: payload.subject.trim().to_string(),
        score: payload.score,
        notes: payload.notes,
    };
    db::scores::upsert_score(&state.db, &score)
        .await
        .map_err(paneltrack_common::Error::Database)?;

    Ok(Json(score))
}

// ---- printing checklist ----

/// GET /api/panels/:guid/print-items
pub async fn list_print_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Vec<db::print_items::PrintItem>>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    Ok(Json(db::print_items::list_for_panel(&state.db, guid).await?))
}

/// POST /api/panels/:guid/print-items
pub async fn create_print_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<PrintItemRequest>,
) -> ApiResult<Json<db::print_items::PrintItem>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    if payload.item_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Item name cannot be empty".to_string()));
    }
    if payload.quantity < 1 {
        return Err(ApiError::BadRequest("Quantity must be at least 1".to_string()));
    }

    let item = db::print_items::PrintItem {
        guid: Uuid::new_v4(),
        panel_guid: guid,
        item_name: payload.item_name.trim().to_string(),
        quantity: payload.quantity,
        printed: false,
        printed_at: None,
        notes: payload.notes,
    };

    db::print_items::create_item(&state.db, &item).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict(format!(
                "Item '{}' is already on the checklist",
                item.item_name
            ))
        } else {
            e.into()
        }
    })?;

    Ok(Json(item))
}

/// PUT /api/panels/:guid/print-items/:item_guid
pub async fn update_print_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((guid, item_guid)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PrintItemUpdateRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    if payload.quantity < 1 {
        return Err(ApiError::BadRequest("Quantity must be at least 1".to_string()));
    }

    let updated = db::print_items::update_item(
        &state.db,
        item_guid,
        payload.quantity,
        payload.printed,
        payload.notes.as_deref(),
    )
    .await?;

    if !updated {
        return Err(ApiError::NotFound(format!("Print item {}", item_guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/panels/:guid/print-items/:item_guid
pub async fn delete_print_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((guid, item_guid)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    let deleted = db::print_items::delete_item(&state.db, item_guid).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Print item {}", item_guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Build panel routes
pub fn panel_routes() -> Router<AppState> {
    Router::new()
        .route("/api/panels", get(list_panels).post(create_panel))
        .route(
            "/api/panels/:guid",
            get(get_panel).put(update_panel).delete(delete_panel),
        )
        .route(
            "/api/panels/:guid/attendees",
            get(list_attendees).post(add_attendee),
        )
        .route(
            "/api/panels/:guid/attendees/:attendee_guid",
            axum::routing::put(update_attendee).delete(remove_attendee),
        )
        .route(
            "/api/panels/:guid/scores",
            get(list_scores).put(put_score),
        )
        .route(
            "/api/panels/:guid/print-items",
            get(list_print_items).post(create_print_item),
        )
        .route(
            "/api/panels/:guid/print-items/:item_guid",
            axum::routing::put(update_print_item).delete(delete_print_item),
        )
}
