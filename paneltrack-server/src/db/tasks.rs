//! Task and task template database operations
//!
//! Templates describe the standing preparation checklist (booking,
//! paperwork, catering); applying them to a panel materializes tasks
//! with due dates offset from the panel start.

use chrono::{Duration, NaiveDate};
use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub const TASK_STATUSES: &[&str] = &["pending", "in_progress", "done"];

/// Task template record
#[derive(Debug, Clone, Serialize)]
pub struct TaskTemplate {
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub offset_days: i64,
}

/// Task record
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub guid: Uuid,
    pub panel_guid: Uuid,
    pub template_guid: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub assigned_to: Option<String>,
    pub completed_at: Option<String>,
}

fn row_to_template(row: &sqlx::sqlite::SqliteRow) -> Result<TaskTemplate> {
    let guid_str: String = row.get("guid");
    Ok(TaskTemplate {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad template guid: {}", e)))?,
        name: row.get("name"),
        description: row.get("description"),
        category: row.get("category"),
        offset_days: row.get("offset_days"),
    })
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task> {
    let guid_str: String = row.get("guid");
    let panel_str: String = row.get("panel_guid");
    let template_str: Option<String> = row.get("template_guid");

    Ok(Task {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad task guid: {}", e)))?,
        panel_guid: Uuid::parse_str(&panel_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad panel guid: {}", e)))?,
        template_guid: template_str
            .map(|s| Uuid::parse_str(&s))
            .transpose()
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad template guid: {}", e)))?,
        title: row.get("title"),
        description: row.get("description"),
        due_date: row.get("due_date"),
        status: row.get("status"),
        assigned_to: row.get("assigned_to"),
        completed_at: row.get("completed_at"),
    })
}

// ---- templates ----

pub async fn list_templates(pool: &SqlitePool) -> Result<Vec<TaskTemplate>> {
    let rows = sqlx::query(
        "SELECT guid, name, description, category, offset_days FROM task_templates ORDER BY offset_days, name",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_template).collect()
}

pub async fn load_template(pool: &SqlitePool, guid: Uuid) -> Result<Option<TaskTemplate>> {
    let row = sqlx::query(
        "SELECT guid, name, description, category, offset_days FROM task_templates WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_template).transpose()
}

pub async fn create_template(pool: &SqlitePool, template: &TaskTemplate) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO task_templates (guid, name, description, category, offset_days)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(template.guid.to_string())
    .bind(&template.name)
    .bind(&template.description)
    .bind(&template.category)
    .bind(template.offset_days)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_template(pool: &SqlitePool, template: &TaskTemplate) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE task_templates
        SET name = ?, description = ?, category = ?, offset_days = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&template.name)
    .bind(&template.description)
    .bind(&template.category)
    .bind(template.offset_days)
    .bind(template.guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_template(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM task_templates WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ---- tasks ----

const TASK_COLUMNS: &str = "guid, panel_guid, template_guid, title, description, due_date, status, assigned_to, completed_at";

pub async fn list_tasks_for_panel(pool: &SqlitePool, panel_guid: Uuid) -> Result<Vec<Task>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE panel_guid = ? ORDER BY due_date IS NULL, due_date, title"
    );
    let rows = sqlx::query(&sql)
        .bind(panel_guid.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_task).collect()
}

pub async fn load_task(pool: &SqlitePool, guid: Uuid) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE guid = ?");
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_task).transpose()
}

pub async fn create_task(pool: &SqlitePool, task: &Task) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tasks (guid, panel_guid, template_guid, title, description, due_date, status, assigned_to)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(task.guid.to_string())
    .bind(task.panel_guid.to_string())
    .bind(task.template_guid.map(|g| g.to_string()))
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.due_date)
    .bind(&task.status)
    .bind(&task.assigned_to)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a task; completed_at is stamped when status lands on done and
/// cleared otherwise
pub async fn update_task(pool: &SqlitePool, task: &Task) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?, description = ?, due_date = ?, status = ?, assigned_to = ?,
            completed_at = CASE WHEN ? = 'done'
                                THEN COALESCE(completed_at, CURRENT_TIMESTAMP)
                                ELSE NULL END,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.due_date)
    .bind(&task.status)
    .bind(&task.assigned_to)
    .bind(&task.status)
    .bind(task.guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_task(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Instantiate every template against a panel start date
///
/// Skips templates whose name already exists as a task title on the
/// panel, so re-applying is idempotent. Returns how many tasks were
/// created.
pub async fn apply_templates(
    pool: &SqlitePool,
    panel_guid: Uuid,
    start_date: NaiveDate,
) -> Result<usize> {
    let templates = list_templates(pool).await?;
    let mut created = 0;

    for template in templates {
        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE panel_guid = ? AND title = ?",
        )
        .bind(panel_guid.to_string())
        .bind(&template.name)
        .fetch_one(pool)
        .await?;

        if exists > 0 {
            continue;
        }

        let due_date = start_date + Duration::days(template.offset_days);
        let task = Task {
            guid: Uuid::new_v4(),
            panel_guid,
            template_guid: Some(template.guid),
            title: template.name.clone(),
            description: template.description.clone(),
            due_date: Some(due_date),
            status: "pending".to_string(),
            assigned_to: None,
            completed_at: None,
        };
        create_task(pool, &task).await?;
        created += 1;
    }

    Ok(created)
}

/// Insert-or-update a task keyed on (panel, title) (import path)
pub async fn upsert_task_by_title(
    executor: &mut sqlx::SqliteConnection,
    task: &Task,
) -> std::result::Result<(), sqlx::Error> {
    let existing: Option<String> =
        sqlx::query_scalar("SELECT guid FROM tasks WHERE panel_guid = ? AND title = ?")
            .bind(task.panel_guid.to_string())
            .bind(&task.title)
            .fetch_optional(&mut *executor)
            .await?;

    match existing {
        Some(guid) => {
            sqlx::query(
                r#"
                UPDATE tasks
                SET description = COALESCE(?, description),
                    due_date = COALESCE(?, due_date),
                    status = ?,
                    assigned_to = COALESCE(?, assigned_to),
                    updated_at = CURRENT_TIMESTAMP
                WHERE guid = ?
                "#,
            )
            .bind(&task.description)
            .bind(task.due_date)
            .bind(&task.status)
            .bind(&task.assigned_to)
            .bind(guid)
            .execute(executor)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO tasks (guid, panel_guid, title, description, due_date, status, assigned_to)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(task.guid.to_string())
            .bind(task.panel_guid.to_string())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.due_date)
            .bind(&task.status)
            .bind(&task.assigned_to)
            .execute(executor)
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await.unwrap();
        paneltrack_common::db::init::create_all_tables(&pool).await.unwrap();
        pool
    }

    async fn insert_panel(pool: &SqlitePool) -> Uuid {
        let guid = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO panels (guid, name, panel_type, start_date, end_date) VALUES (?, 'P', 'panel', '2026-03-02', '2026-03-04')",
        )
        .bind(guid.to_string())
        .execute(pool)
        .await
        .unwrap();
        guid
    }

    #[tokio::test]
    async fn test_apply_templates_offsets_and_idempotency() {
        let pool = test_pool().await;
        let panel_guid = insert_panel(&pool).await;

        create_template(
            &pool,
            &TaskTemplate {
                guid: Uuid::new_v4(),
                name: "Book venue".to_string(),
                description: None,
                category: Some("logistics".to_string()),
                offset_days: -42,
            },
        )
        .await
        .unwrap();
        create_template(
            &pool,
            &TaskTemplate {
                guid: Uuid::new_v4(),
                name: "Send joining instructions".to_string(),
                description: None,
                category: Some("admin".to_string()),
                offset_days: -14,
            },
        )
        .await
        .unwrap();

        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let created = apply_templates(&pool, panel_guid, start).await.unwrap();
        assert_eq!(created, 2);

        let tasks = list_tasks_for_panel(&pool, panel_guid).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(
            tasks[0].due_date,
            Some(NaiveDate::from_ymd_opt(2026, 1, 19).unwrap())
        );

        // Second application creates nothing new
        let created = apply_templates(&pool, panel_guid, start).await.unwrap();
        assert_eq!(created, 0);
    }

    #[tokio::test]
    async fn test_done_stamps_completed_at() {
        let pool = test_pool().await;
        let panel_guid = insert_panel(&pool).await;

        let mut task = Task {
            guid: Uuid::new_v4(),
            panel_guid,
            template_guid: None,
            title: "Print papers".to_string(),
            description: None,
            due_date: None,
            status: "pending".to_string(),
            assigned_to: None,
            completed_at: None,
        };
        create_task(&pool, &task).await.unwrap();

        task.status = "done".to_string();
        update_task(&pool, &task).await.unwrap();
        let loaded = load_task(&pool, task.guid).await.unwrap().unwrap();
        assert!(loaded.completed_at.is_some());

        // Reopening clears the stamp
        task.status = "pending".to_string();
        update_task(&pool, &task).await.unwrap();
        let loaded = load_task(&pool, task.guid).await.unwrap().unwrap();
        assert!(loaded.completed_at.is_none());
    }
}
