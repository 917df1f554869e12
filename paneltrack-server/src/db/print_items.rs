//! Panel printing checklist database operations

use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Printing checklist row
#[derive(Debug, Clone, Serialize)]
pub struct PrintItem {
    pub guid: Uuid,
    pub panel_guid: Uuid,
    pub item_name: String,
    pub quantity: i64,
    pub printed: bool,
    pub printed_at: Option<String>,
    pub notes: Option<String>,
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<PrintItem> {
    let guid_str: String = row.get("guid");
    let panel_str: String = row.get("panel_guid");
    let printed: i64 = row.get("printed");

    Ok(PrintItem {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad item guid: {}", e)))?,
        panel_guid: Uuid::parse_str(&panel_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad panel guid: {}", e)))?,
        item_name: row.get("item_name"),
        quantity: row.get("quantity"),
        printed: printed != 0,
        printed_at: row.get("printed_at"),
        notes: row.get("notes"),
    })
}

pub async fn list_for_panel(pool: &SqlitePool, panel_guid: Uuid) -> Result<Vec<PrintItem>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, panel_guid, item_name, quantity, printed, printed_at, notes
        FROM panel_print_items
        WHERE panel_guid = ?
        ORDER BY item_name
        "#,
    )
    .bind(panel_guid.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_item).collect()
}

pub async fn create_item(pool: &SqlitePool, item: &PrintItem) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO panel_print_items (guid, panel_guid, item_name, quantity, notes)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(item.guid.to_string())
    .bind(item.panel_guid.to_string())
    .bind(&item.item_name)
    .bind(item.quantity)
    .bind(&item.notes)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a checklist row; marking printed stamps printed_at, clearing
/// it resets the stamp
pub async fn update_item(
    pool: &SqlitePool,
    guid: Uuid,
    quantity: i64,
    printed: bool,
    notes: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE panel_print_items
        SET quantity = ?,
            printed = ?,
            printed_at = CASE WHEN ? THEN COALESCE(printed_at, CURRENT_TIMESTAMP) ELSE NULL END,
            notes = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(quantity)
    .bind(printed)
    .bind(printed)
    .bind(notes)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_item(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM panel_print_items WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
