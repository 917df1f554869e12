//! Task and task template endpoints

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::require_user;
use crate::db;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub offset_days: i64,
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_task_status")]
    pub status: String,
    pub assigned_to: Option<String>,
}

fn default_task_status() -> String {
    "pending".to_string()
}

#[derive(Debug, Serialize)]
pub struct ApplyTemplatesResponse {
    pub created: usize,
}

async fn panel_or_404(state: &AppState, guid: Uuid) -> ApiResult<db::panels::Panel> {
    db::panels::load_panel(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Panel {}", guid)))
}

fn validate_task(payload: &TaskRequest) -> ApiResult<()> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Task title cannot be empty".to_string()));
    }
    if !db::tasks::TASK_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unknown status '{}'",
            payload.status
        )));
    }
    Ok(())
}

// ---- templates ----

/// GET /api/tasks/templates
pub async fn list_templates(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<db::tasks::TaskTemplate>>> {
    require_user(&state, &headers).await?;
    Ok(Json(db::tasks::list_templates(&state.db).await?))
}

/// POST /api/tasks/templates
pub async fn create_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TemplateRequest>,
) -> ApiResult<Json<db::tasks::TaskTemplate>> {
    require_user(&state, &headers).await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Template name cannot be empty".to_string()));
    }

    let template = db::tasks::TaskTemplate {
        guid: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        category: payload.category,
        offset_days: payload.offset_days,
    };

    db::tasks::create_template(&state.db, &template).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict(format!("Template '{}' already exists", template.name))
        } else {
            e.into()
        }
    })?;

    Ok(Json(template))
}

/// PUT /api/tasks/templates/:guid
pub async fn update_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<TemplateRequest>,
) -> ApiResult<Json<db::tasks::TaskTemplate>> {
    require_user(&state, &headers).await?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Template name cannot be empty".to_string()));
    }

    let template = db::tasks::TaskTemplate {
        guid,
        name: payload.name.trim().to_string(),
        description: payload.description,
        category: payload.category,
        offset_days: payload.offset_days,
    };

    let updated = db::tasks::update_template(&state.db, &template).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict(format!("Template '{}' already exists", template.name))
        } else {
            e.into()
        }
    })?;

    if !updated {
        return Err(ApiError::NotFound(format!("Template {}", guid)));
    }

    Ok(Json(template))
}

/// DELETE /api/tasks/templates/:guid
pub async fn delete_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;

    let deleted = db::tasks::delete_template(&state.db, guid).await.map_err(|e| {
        if db::is_fk_violation(&e) {
            ApiError::Conflict("Template is referenced by existing tasks".to_string())
        } else {
            e.into()
        }
    })?;

    if !deleted {
        return Err(ApiError::NotFound(format!("Template {}", guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

// ---- per-panel tasks ----

/// GET /api/panels/:guid/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<Vec<db::tasks::Task>>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    Ok(Json(db::tasks::list_tasks_for_panel(&state.db, guid).await?))
}

/// POST /api/panels/:guid/tasks
pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
    Json(payload): Json<TaskRequest>,
) -> ApiResult<Json<db::tasks::Task>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;
    validate_task(&payload)?;

    let task = db::tasks::Task {
        guid: Uuid::new_v4(),
        panel_guid: guid,
        template_guid: None,
        title: payload.title.trim().to_string(),
        description: payload.description,
        due_date: payload.due_date,
        status: payload.status,
        assigned_to: payload.assigned_to,
        completed_at: None,
    };
    db::tasks::create_task(&state.db, &task).await?;

    Ok(Json(task))
}

/// PUT /api/panels/:guid/tasks/:task_guid
pub async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((guid, task_guid)): Path<(Uuid, Uuid)>,
    Json(payload): Json<TaskRequest>,
) -> ApiResult<Json<db::tasks::Task>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;
    validate_task(&payload)?;

    let task = db::tasks::Task {
        guid: task_guid,
        panel_guid: guid,
        template_guid: None,
        title: payload.title.trim().to_string(),
        description: payload.description,
        due_date: payload.due_date,
        status: payload.status,
        assigned_to: payload.assigned_to,
        completed_at: None,
    };

    let updated = db::tasks::update_task(&state.db, &task).await?;
    if !updated {
        return Err(ApiError::NotFound(format!("Task {}", task_guid)));
    }

    let task = db::tasks::load_task(&state.db, task_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {}", task_guid)))?;

    Ok(Json(task))
}

/// DELETE /api/panels/:guid/tasks/:task_guid
pub async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((guid, task_guid)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    require_user(&state, &headers).await?;
    panel_or_404(&state, guid).await?;

    let deleted = db::tasks::delete_task(&state.db, task_guid).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Task {}", task_guid)));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/panels/:guid/tasks/apply-templates
///
/// Materializes every template against the panel start date; titles
/// that already exist on the panel are left alone.
pub async fn apply_templates(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<ApplyTemplatesResponse>> {
    require_user(&state, &headers).await?;
    let panel = panel_or_404(&state, guid).await?;

    let created = db::tasks::apply_templates(&state.db, guid, panel.start_date).await?;

    Ok(Json(ApplyTemplatesResponse { created }))
}

/// Build task routes
pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tasks/templates",
            get(list_templates).post(create_template),
        )
        .route(
            "/api/tasks/templates/:guid",
            axum::routing::put(update_template).delete(delete_template),
        )
        .route(
            "/api/panels/:guid/tasks",
            get(list_tasks).post(create_task),
        )
        .route(
            "/api/panels/:guid/tasks/apply-templates",
            post(apply_templates),
        )
        .route(
            "/api/panels/:guid/tasks/:task_guid",
            axum::routing::put(update_task).delete(delete_task),
        )
}
