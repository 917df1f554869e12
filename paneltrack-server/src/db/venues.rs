//! Venue database operations

use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Venue record
#[derive(Debug, Clone, Serialize)]
pub struct Venue {
    pub guid: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub capacity: Option<i64>,
    pub notes: Option<String>,
}

fn row_to_venue(row: &sqlx::sqlite::SqliteRow) -> Result<Venue> {
    let guid_str: String = row.get("guid");
    Ok(Venue {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad venue guid: {}", e)))?,
        name: row.get("name"),
        address: row.get("address"),
        capacity: row.get("capacity"),
        notes: row.get("notes"),
    })
}

pub async fn list_venues(pool: &SqlitePool) -> Result<Vec<Venue>> {
    let rows = sqlx::query("SELECT guid, name, address, capacity, notes FROM venues ORDER BY name")
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_venue).collect()
}

pub async fn load_venue(pool: &SqlitePool, guid: Uuid) -> Result<Option<Venue>> {
    let row = sqlx::query("SELECT guid, name, address, capacity, notes FROM venues WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_venue).transpose()
}

pub async fn find_venue_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Venue>> {
    let row = sqlx::query("SELECT guid, name, address, capacity, notes FROM venues WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_venue).transpose()
}

pub async fn create_venue(pool: &SqlitePool, venue: &Venue) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO venues (guid, name, address, capacity, notes)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(venue.guid.to_string())
    .bind(&venue.name)
    .bind(&venue.address)
    .bind(venue.capacity)
    .bind(&venue.notes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_venue(pool: &SqlitePool, venue: &Venue) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE venues
        SET name = ?, address = ?, capacity = ?, notes = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&venue.name)
    .bind(&venue.address)
    .bind(venue.capacity)
    .bind(&venue.notes)
    .bind(venue.guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a venue; fails with a foreign-key violation while panels
/// still reference it
pub async fn delete_venue(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM venues WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Find a venue guid by name inside a transaction (import path)
pub async fn find_venue_by_name_tx(
    executor: &mut sqlx::SqliteConnection,
    name: &str,
) -> std::result::Result<Option<Uuid>, sqlx::Error> {
    let row = sqlx::query("SELECT guid FROM venues WHERE name = ?")
        .bind(name)
        .fetch_optional(executor)
        .await?;

    Ok(row.and_then(|r| {
        let guid: String = r.get("guid");
        Uuid::parse_str(&guid).ok()
    }))
}

/// Upsert by unique name (import path)
pub async fn upsert_venue_by_name(
    executor: &mut sqlx::SqliteConnection,
    name: &str,
    address: Option<&str>,
    capacity: Option<i64>,
    notes: Option<&str>,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO venues (guid, name, address, capacity, notes)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            address = COALESCE(excluded.address, address),
            capacity = COALESCE(excluded.capacity, capacity),
            notes = COALESCE(excluded.notes, notes),
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(address)
    .bind(capacity)
    .bind(notes)
    .execute(executor)
    .await?;

    Ok(())
}
