//! Worship schedule database operations
//!
//! One schedule per panel, stored as a JSON array of services. The
//! array is replaced wholesale on save.

use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Worship schedule for a panel
#[derive(Debug, Clone, Serialize)]
pub struct WorshipSchedule {
    pub guid: Uuid,
    pub panel_guid: Uuid,
    pub services: serde_json::Value,
}

pub async fn load_for_panel(pool: &SqlitePool, panel_guid: Uuid) -> Result<Option<WorshipSchedule>> {
    let row = sqlx::query("SELECT guid, panel_guid, services FROM worship_schedule WHERE panel_guid = ?")
        .bind(panel_guid.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            let services_str: String = row.get("services");

            let services = serde_json::from_str(&services_str).map_err(|e| {
                paneltrack_common::Error::Internal(format!("Bad services JSON: {}", e))
            })?;

            Ok(Some(WorshipSchedule {
                guid: Uuid::parse_str(&guid_str).map_err(|e| {
                    paneltrack_common::Error::Internal(format!("Bad schedule guid: {}", e))
                })?,
                panel_guid,
                services,
            }))
        }
        None => Ok(None),
    }
}

/// Upsert the schedule for a panel, replacing the services array
pub async fn upsert_for_panel(
    pool: &SqlitePool,
    panel_guid: Uuid,
    services: &serde_json::Value,
) -> Result<()> {
    let services_str = serde_json::to_string(services)
        .map_err(|e| paneltrack_common::Error::Internal(format!("Serialize services: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO worship_schedule (guid, panel_guid, services)
        VALUES (?, ?, ?)
        ON CONFLICT(panel_guid) DO UPDATE SET
            services = excluded.services,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(panel_guid.to_string())
    .bind(&services_str)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_for_panel(pool: &SqlitePool, panel_guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM worship_schedule WHERE panel_guid = ?")
        .bind(panel_guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
