//! Panel attendee database operations
//!
//! Attendees tie people to a panel: candidates being assessed, advisers
//! assessing, and the panel secretary. Team and designation are free
//! tags used to group interviews.

use paneltrack_common::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub const ATTENDEE_TYPES: &[&str] = &["candidate", "adviser", "secretary"];

/// Attendee row
#[derive(Debug, Clone, Serialize)]
pub struct Attendee {
    pub guid: Uuid,
    pub panel_guid: Uuid,
    pub attendee_type: String,
    pub candidate_guid: Option<Uuid>,
    pub adviser_guid: Option<Uuid>,
    pub team: Option<String>,
    pub designation: Option<String>,
}

/// Attendee row joined with person names for rosters
#[derive(Debug, Clone, Serialize)]
pub struct AttendeeDetail {
    #[serde(flatten)]
    pub attendee: Attendee,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

fn parse_optional_uuid(value: Option<String>, what: &str) -> Result<Option<Uuid>> {
    value
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| paneltrack_common::Error::Internal(format!("Bad {} guid: {}", what, e)))
}

fn row_to_attendee(row: &sqlx::sqlite::SqliteRow) -> Result<Attendee> {
    let guid_str: String = row.get("guid");
    let panel_str: String = row.get("panel_guid");

    Ok(Attendee {
        guid: Uuid::parse_str(&guid_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad attendee guid: {}", e)))?,
        panel_guid: Uuid::parse_str(&panel_str)
            .map_err(|e| paneltrack_common::Error::Internal(format!("Bad panel guid: {}", e)))?,
        attendee_type: row.get("attendee_type"),
        candidate_guid: parse_optional_uuid(row.get("candidate_guid"), "candidate")?,
        adviser_guid: parse_optional_uuid(row.get("adviser_guid"), "adviser")?,
        team: row.get("team"),
        designation: row.get("designation"),
    })
}

/// List attendees for a panel with joined person details
pub async fn list_for_panel(pool: &SqlitePool, panel_guid: Uuid) -> Result<Vec<AttendeeDetail>> {
    let rows = sqlx::query(
        r#"
        SELECT a.guid, a.panel_guid, a.attendee_type, a.candidate_guid, a.adviser_guid,
               a.team, a.designation,
               COALESCE(c.first_name || ' ' || c.last_name,
                        v.first_name || ' ' || v.last_name) AS display_name,
               COALESCE(c.email, v.email) AS email
        FROM panel_attendees a
        LEFT JOIN candidates c ON c.guid = a.candidate_guid
        LEFT JOIN advisers v ON v.guid = a.adviser_guid
        WHERE a.panel_guid = ?
        ORDER BY a.attendee_type, display_name
        "#,
    )
    .bind(panel_guid.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(AttendeeDetail {
                attendee: row_to_attendee(row)?,
                display_name: row.get("display_name"),
                email: row.get("email"),
            })
        })
        .collect()
}

pub async fn load_attendee(pool: &SqlitePool, guid: Uuid) -> Result<Option<Attendee>> {
    let row = sqlx::query(
        r#"
        SELECT guid, panel_guid, attendee_type, candidate_guid, adviser_guid, team, designation
        FROM panel_attendees
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_attendee).transpose()
}

pub async fn add_attendee(pool: &SqlitePool, attendee: &Attendee) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO panel_attendees
            (guid, panel_guid, attendee_type, candidate_guid, adviser_guid, team, designation)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(attendee.guid.to_string())
    .bind(attendee.panel_guid.to_string())
    .bind(&attendee.attendee_type)
    .bind(attendee.candidate_guid.map(|g| g.to_string()))
    .bind(attendee.adviser_guid.map(|g| g.to_string()))
    .bind(&attendee.team)
    .bind(&attendee.designation)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update the mutable tags on an attendee row
pub async fn update_attendee(
    pool: &SqlitePool,
    guid: Uuid,
    team: Option<&str>,
    designation: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE panel_attendees
        SET team = ?, designation = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(team)
    .bind(designation)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn remove_attendee(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM panel_attendees WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert-or-update an attendee keyed on (panel, person) (import path)
pub async fn upsert_attendee(
    executor: &mut sqlx::SqliteConnection,
    attendee: &Attendee,
) -> std::result::Result<(), sqlx::Error> {
    let existing: Option<String> = sqlx::query_scalar(
        r#"
        SELECT guid FROM panel_attendees
        WHERE panel_guid = ?
          AND (candidate_guid = ? OR adviser_guid = ?)
        "#,
    )
    .bind(attendee.panel_guid.to_string())
    .bind(attendee.candidate_guid.map(|g| g.to_string()))
    .bind(attendee.adviser_guid.map(|g| g.to_string()))
    .fetch_optional(&mut *executor)
    .await?;

    match existing {
        Some(guid) => {
            sqlx::query(
                r#"
                UPDATE panel_attendees
                SET attendee_type = ?, team = ?, designation = ?, updated_at = CURRENT_TIMESTAMP
                WHERE guid = ?
                "#,
            )
            .bind(&attendee.attendee_type)
            .bind(&attendee.team)
            .bind(&attendee.designation)
            .bind(guid)
            .execute(executor)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO panel_attendees
                    (guid, panel_guid, attendee_type, candidate_guid, adviser_guid, team, designation)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(attendee.guid.to_string())
            .bind(attendee.panel_guid.to_string())
            .bind(&attendee.attendee_type)
            .bind(attendee.candidate_guid.map(|g| g.to_string()))
            .bind(attendee.adviser_guid.map(|g| g.to_string()))
            .bind(&attendee.team)
            .bind(&attendee.designation)
            .execute(executor)
            .await?;
        }
    }

    Ok(())
}
