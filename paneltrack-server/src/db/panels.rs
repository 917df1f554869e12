//! Panel database operations
//!
//! A panel is a multi-day discernment event; a carousel is the shorter,
//! earlier-stage variant. Both live in the panels table distinguished by
//! panel_type.

use chrono::NaiveDate;
use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub const PANEL_TYPES: &[&str] = &["panel", "carousel"];
pub const PANEL_STATUSES: &[&str] = &["planned", "confirmed", "completed", "cancelled"];

/// Panel record
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub guid: Uuid,
    pub name: String,
    pub panel_type: String,
    pub venue_guid: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
}

fn row_to_panel(row: &sqlx::sqlite::SqliteRow) -> Result<Panel> {
    let guid_str: String = row.get("guid");
    let venue_str: Option<String> = row.get("venue_guid");

    let venue_guid = venue_str
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| paneltrack_common::Error::Internal(format!("Bad venue guid: {}", e)))?;

    Ok(Panel {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad panel guid: {}", e)))?,
        name: row.get("name"),
        panel_type: row.get("panel_type"),
        venue_guid,
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: row.get("status"),
        notes: row.get("notes"),
    })
}

const PANEL_COLUMNS: &str =
    "guid, name, panel_type, venue_guid, start_date, end_date, status, notes";

/// List panels, newest start date first; optional type/status filters
pub async fn list_panels(
    pool: &SqlitePool,
    panel_type: Option<&str>,
    status: Option<&str>,
) -> Result<Vec<Panel>> {
    let sql = format!(
        r#"
        SELECT {PANEL_COLUMNS}
        FROM panels
        WHERE (?1 IS NULL OR panel_type = ?1)
          AND (?2 IS NULL OR status = ?2)
        ORDER BY start_date DESC, name
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(panel_type)
        .bind(status)
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_panel).collect()
}

pub async fn load_panel(pool: &SqlitePool, guid: Uuid) -> Result<Option<Panel>> {
    let sql = format!("SELECT {PANEL_COLUMNS} FROM panels WHERE guid = ?");
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_panel).transpose()
}

/// Find a panel by its display name (import path)
pub async fn find_panel_by_name(
    executor: &mut sqlx::SqliteConnection,
    name: &str,
) -> std::result::Result<Option<Uuid>, sqlx::Error> {
    let row = sqlx::query("SELECT guid FROM panels WHERE name = ?")
        .bind(name)
        .fetch_optional(executor)
        .await?;

    Ok(row.and_then(|r| {
        let guid: String = r.get("guid");
        Uuid::parse_str(&guid).ok()
    }))
}

pub async fn create_panel(pool: &SqlitePool, panel: &Panel) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO panels (guid, name, panel_type, venue_guid, start_date, end_date, status, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(panel.guid.to_string())
    .bind(&panel.name)
    .bind(&panel.panel_type)
    .bind(panel.venue_guid.map(|g| g.to_string()))
    .bind(panel.start_date)
    .bind(panel.end_date)
    .bind(&panel.status)
    .bind(&panel.notes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_panel(pool: &SqlitePool, panel: &Panel) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE panels
        SET name = ?, panel_type = ?, venue_guid = ?, start_date = ?,
            end_date = ?, status = ?, notes = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&panel.name)
    .bind(&panel.panel_type)
    .bind(panel.venue_guid.map(|g| g.to_string()))
    .bind(panel.start_date)
    .bind(panel.end_date)
    .bind(&panel.status)
    .bind(&panel.notes)
    .bind(panel.guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a panel; attendees, tasks, scores, worship schedule and print
/// items cascade
pub async fn delete_panel(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM panels WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert-or-update a panel keyed on its display name (import path)
pub async fn upsert_panel_by_name(
    executor: &mut sqlx::SqliteConnection,
    panel: &Panel,
) -> std::result::Result<(), sqlx::Error> {
    let existing = find_panel_by_name(&mut *executor, &panel.name).await?;

    match existing {
        Some(guid) => {
            sqlx::query(
                r#"
                UPDATE panels
                SET panel_type = ?, venue_guid = COALESCE(?, venue_guid), start_date = ?,
                    end_date = ?, status = ?, notes = COALESCE(?, notes),
                    updated_at = CURRENT_TIMESTAMP
                WHERE guid = ?
                "#,
            )
            .bind(&panel.panel_type)
            .bind(panel.venue_guid.map(|g| g.to_string()))
            .bind(panel.start_date)
            .bind(panel.end_date)
            .bind(&panel.status)
            .bind(&panel.notes)
            .bind(guid.to_string())
            .execute(executor)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO panels (guid, name, panel_type, venue_guid, start_date, end_date, status, notes)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(panel.guid.to_string())
            .bind(&panel.name)
            .bind(&panel.panel_type)
            .bind(panel.venue_guid.map(|g| g.to_string()))
            .bind(panel.start_date)
            .bind(panel.end_date)
            .bind(&panel.status)
            .bind(&panel.notes)
            .execute(executor)
            .await?;
        }
    }

    Ok(())
}

/// Panels for the calendar feed: everything not cancelled
pub async fn list_calendar_panels(pool: &SqlitePool) -> Result<Vec<Panel>> {
    let sql = format!(
        "SELECT {PANEL_COLUMNS} FROM panels WHERE status != 'cancelled' ORDER BY start_date"
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(row_to_panel).collect()
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

    fn sample_panel() -> Panel {
        Panel {
            guid: Uuid::new_v4(),
            name: "March Panel".to_string(),
            panel_type: "panel".to_string(),
            venue_guid: None,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            status: "planned".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_load_panel() {
        let pool = test_pool().await;
        let panel = sample_panel();

        create_panel(&pool, &panel).await.unwrap();

        let loaded = load_panel(&pool, panel.guid).await.unwrap().unwrap();
        assert_eq!(loaded.name, "March Panel");
        assert_eq!(loaded.start_date, panel.start_date);
        assert_eq!(loaded.status, "planned");
    }

    #[tokio::test]
    async fn test_list_filters_by_type() {
        let pool = test_pool().await;

        let mut panel = sample_panel();
        create_panel(&pool, &panel).await.unwrap();

        panel.guid = Uuid::new_v4();
        panel.name = "May Carousel".to_string();
        panel.panel_type = "carousel".to_string();
        create_panel(&pool, &panel).await.unwrap();

        let carousels = list_panels(&pool, Some("carousel"), None).await.unwrap();
        assert_eq!(carousels.len(), 1);
        assert_eq!(carousels[0].name, "May Carousel");

        let all = list_panels(&pool, None, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_calendar_excludes_cancelled() {
        let pool = test_pool().await;

        let mut panel = sample_panel();
        create_panel(&pool, &panel).await.unwrap();

        panel.guid = Uuid::new_v4();
        panel.name = "Cancelled Panel".to_string();
        panel.status = "cancelled".to_string();
        create_panel(&pool, &panel).await.unwrap();

        let feed = list_calendar_panels(&pool).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].name, "March Panel");
    }

    #[tokio::test]
    async fn test_invalid_type_rejected_by_check() {
        let pool = test_pool().await;
        let mut panel = sample_panel();
        panel.panel_type = "retreat".to_string();

        let result = create_panel(&pool, &panel).await;
        assert!(result.is_err());
        assert!(crate::db::is_check_violation(&result.unwrap_err()));
    }
}
