//! Candidate endpoints: candidate CRUD plus the compliance record
//! subresource

use axum::{
    extract::{Path, State},
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
pub struct CandidateRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub diocese: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub record_type: String,
    #[serde(default = "default_record_status")]
    pub status: String,
    pub notes: Option<String>,
}

fn default_record_status() -> String {
    "pending".to_string()
}

fn validate(payload: &CandidateRequest) -> ApiResult<()> {
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "First and last name are required".to_string(),
        ));
    }
    Ok(())
}

async fn candidate_or_404(state: &AppState, guid: Uuid) -> ApiResult<db::candidates::Candidate> {
    db::candidates::load_candidate(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Candidate {}", guid)))
}

/// GET /api/candidates
pub async fn list_candidates(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<db::candidates::Candidate>>> {
    require_user(&state, &headers).await?;
    Ok(Json(db::candidates::list_candidates(&state.db).await?))
}

/// POST /api/candidates
pub async fn create_candidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CandidateRequest>,
) -> ApiResult<Json<db::candidates::Candidate>> {
    require_user(&state, &headers).await?;
    validate(&payload)?;

    let candidate = db::candidates::Candidate {
        guid: Uuid::new_v4(),
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: payload.email,
        diocese: payload.diocese,
        phone: payload.phone,
        date_of_birth: payload.date_of_birth,
        notes: payload.notes,
    };

    db::candidates::create_candidate(&state.db, &candidate)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::Conflict("A candidate with that email already exists".to_string())
            } else {
                e.into()
            }
        })?;

    Ok(Json(candidate))
}

/// GET /api/candidates/:guid
pub async fn get_candidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<db::candidates::Candidate>> {
    require_user(&state, &headers).await?;
    Ok(Json(candidate_or_404(&state, guid).await?))
}

/// PUT /api/candidates/:guid
pub async fn update_candidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<CandidateRequest>,
) -> ApiResult<Json<db::candidates::Candidate>> {
    require_user(&state, &headers).await?;
    validate(&payload)?;

    let candidate = db::candidates::Candidate {
        guid,
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: payload.email,
        diocese: payload.diocese,
        phone: payload.phone,
        date_of_birth: payload.date_of_birth,
        notes: payload.notes,
    };

    let updated = db::candidates::update_candidate(&state.db, &candidate)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::Conflict("A candidate with that email already exists".to_string())
            } else {
                e.into()
            }
        })?;

    if !updated {
        return Err(ApiError::NotFound(format!("Candidate {}", guid)));
    }

    Ok(Json(candidate))
}

/// DELETE /api/candidates/:guid
pub async fn delete_candidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;

    let deleted = db::candidates::delete_candidate(&state.db, guid)
        .await
        .map_err(|e| {
            if db::is_fk_violation(&e) {
                ApiError::Conflict(
                    "Candidate is referenced by panels or scores".to_string(),
                )
            } else {
                e.into()
            }
        })?;

    if !deleted {
        return Err(ApiError::NotFound(format!("Candidate {}", guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

// ---- compliance records ----

/// GET /api/candidates/:guid/records
pub async fn list_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Vec<db::candidate_records::CandidateRecord>>> {
    require_user(&state, &headers).await?;
    candidate_or_404(&state, guid).await?;

    Ok(Json(
        db::candidate_records::list_for_candidate(&state.db, guid).await?,
    ))
}

/// PUT /api/candidates/:guid/records
///
/// Upserts the record for (candidate, record_type).
pub async fn put_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<RecordRequest>,
) -> ApiResult<Json<db::candidate_records::CandidateRecord>> {
    require_user(&state, &headers).await?;
    candidate_or_404(&state, guid).await?;

    if payload.record_type.trim().is_empty() {
        return Err(ApiError::BadRequest("Record type cannot be empty".to_string()));
    }
    if !db::candidate_records::RECORD_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unknown status '{}'",
            payload.status
        )));
    }

    let record = db::candidate_records::CandidateRecord {
        guid: Uuid::new_v4(),
        candidate_guid: guid,
        record_type: payload.record_type.trim().to_string(),
        status: payload.status,
        completed_at: None,
        notes: payload.notes,
    };
    db::candidate_records::upsert_record(&state.db, &record)
        .await
        .map_err(paneltrack_common::Error::Database)?;

    Ok(Json(record))
}

/// DELETE /api/candidates/:guid/records/:record_guid
pub async fn delete_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((guid, record_guid)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;
    candidate_or_404(&state, guid).await?;

    let deleted = db::candidate_records::delete_record(&state.db, record_guid).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Record {}", record_guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Build candidate routes
pub fn candidate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/candidates", get(list_candidates).post(create_candidate))
        .route(
            "/api/candidates/:guid",
            get(get_candidate).put(update_candidate).delete(delete_candidate),
        )
        .route(
            "/api/candidates/:guid/records",
            get(list_records).put(put_record),
        )
        .route(
            "/api/candidates/:guid/records/:record_guid",
            axum::routing::delete(delete_record),
        )
}
