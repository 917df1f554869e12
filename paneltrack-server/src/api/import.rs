//! Import endpoints
//!
//! POST /api/import takes a multipart upload holding one .xlsx workbook
//! and runs the sheet pipeline; GET /api/import/history lists recent
//! runs.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::auth::require_user;
use crate::db;
use crate::import::{run_import, ImportSummary};
use crate::{ApiError, ApiResult, AppState};

/// Upload cap for workbooks (16 MiB)
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// POST /api/import
pub async fn upload_workbook(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportSummary>> {
    let user = require_user(&state, &headers).await?;

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .unwrap_or("workbook.xlsx")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        file = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    let summary = match run_import(&state.db, &bytes, &filename, Some(user.username)).await {
        Ok(summary) => summary,
        Err(err) => {
            *state.last_error.write().await = Some(err.to_string());
            return Err(err);
        }
    };

    Ok(Json(summary))
}

/// GET /api/import/history?limit=
pub async fn import_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<db::import_history::ImportRun>>> {
    require_user(&state, &headers).await?;

    let limit = query.limit.clamp(1, 100);
    Ok(Json(db::import_history::list_recent(&state.db, limit).await?))
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/import",
            post(upload_workbook).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/import/history", get(import_history))
}
