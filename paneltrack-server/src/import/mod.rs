//! Spreadsheet import pipeline
//!
//! Accepts an .xlsx workbook and walks a fixed list of sheets in
//! foreign-key dependency order (parents before children). Each sheet
//! runs inside its own transaction: every row is upserted on the
//! sheet's natural key, rows that fail a foreign-key check are recorded
//! as skipped, other row failures are recorded and the sheet carries
//! on, and the transaction commits whatever succeeded.

pub mod columns;
pub mod coerce;

use calamine::{Data, Reader, Xlsx};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::error::{ApiError, ApiResult};
use coerce::{coerce, Coerced, FieldType};
use columns::canonical_field;

/// Sheets in foreign-key dependency order
const SHEETS: &[SheetSpec] = &[
    SheetSpec {
        name: "Venues",
        fields: &[
            ("name", FieldType::Text),
            ("address", FieldType::Text),
            ("capacity", FieldType::Integer),
            ("notes", FieldType::Text),
        ],
    },
    SheetSpec {
        name: "Advisers",
        fields: &[
            ("first_name", FieldType::Text),
            ("last_name", FieldType::Text),
            ("email", FieldType::Text),
            ("quality", FieldType::Text),
            ("phone", FieldType::Text),
            ("notes", FieldType::Text),
        ],
    },
    SheetSpec {
        name: "Candidates",
        fields: &[
            ("first_name", FieldType::Text),
            ("last_name", FieldType::Text),
            ("email", FieldType::Text),
            ("diocese", FieldType::Text),
            ("phone", FieldType::Text),
            ("date_of_birth", FieldType::Date),
            ("notes", FieldType::Text),
        ],
    },
    SheetSpec {
        name: "Panels",
        fields: &[
            ("name", FieldType::Text),
            ("panel_type", FieldType::Text),
            ("venue", FieldType::Text),
            ("start_date", FieldType::Date),
            ("end_date", FieldType::Date),
            ("status", FieldType::Text),
            ("notes", FieldType::Text),
        ],
    },
    SheetSpec {
        name: "Attendees",
        fields: &[
            ("panel", FieldType::Text),
            ("attendee_type", FieldType::Text),
            ("candidate_email", FieldType::Text),
            ("adviser_email", FieldType::Text),
            ("team", FieldType::Text),
            ("designation", FieldType::Text),
        ],
    },
    SheetSpec {
        name: "Tasks",
        fields: &[
            ("panel", FieldType::Text),
            ("title", FieldType::Text),
            ("description", FieldType::Text),
            ("due_date", FieldType::Date),
            ("status", FieldType::Text),
            ("assigned_to", FieldType::Text),
        ],
    },
    SheetSpec {
        name: "Scores",
        fields: &[
            ("panel", FieldType::Text),
            ("adviser_email", FieldType::Text),
            ("candidate_email", FieldType::Text),
            ("subject", FieldType::Text),
            ("score", FieldType::Integer),
            ("notes", FieldType::Text),
        ],
    },
    SheetSpec {
        name: "Candidate Records",
        fields: &[
            ("candidate_email", FieldType::Text),
            ("record_type", FieldType::Text),
            ("status", FieldType::Text),
            ("notes", FieldType::Text),
        ],
    },
];

/// Declared columns for one recognized sheet
pub struct SheetSpec {
    pub name: &'static str,
    pub fields: &'static [(&'static str, FieldType)],
}

/// Look up the spec for a recognized sheet name
pub fn sheet_spec(name: &str) -> Option<&'static SheetSpec> {
    SHEETS.iter().find(|spec| spec.name == name)
}

/// One failed or skipped row
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub sheet: String,
    /// 1-based spreadsheet row number (header is row 1)
    pub row: usize,
    pub message: String,
}

/// Per-sheet aggregate counts
#[derive(Debug, Clone, Serialize)]
pub struct SheetSummary {
    pub sheet: String,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

/// Whole-workbook aggregate counts
#[derive(Debug, Clone, Serialize, Default)]
pub struct ImportSummary {
    pub sheets: Vec<SheetSummary>,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Coerced row keyed by canonical field name
type RowMap = HashMap<&'static str, Coerced>;

/// Outcome of a single row upsert
enum RowOutcome {
    Imported,
    /// Referenced parent is missing; row recorded and passed over
    Skipped(String),
}

fn text(row: &RowMap, field: &str) -> Option<String> {
    match row.get(field) {
        Some(Coerced::Text(s)) => Some(s.clone()),
        _ => None,
    }
}

fn integer(row: &RowMap, field: &str) -> Option<i64> {
    match row.get(field) {
        Some(Coerced::Integer(i)) => Some(*i),
        _ => None,
    }
}

fn date(row: &RowMap, field: &str) -> Option<chrono::NaiveDate> {
    match row.get(field) {
        Some(Coerced::Date(d)) => Some(*d),
        _ => None,
    }
}

/// Run a full workbook import and record it in import_history
pub async fn run_import(
    pool: &SqlitePool,
    bytes: &[u8],
    filename: &str,
    imported_by: Option<String>,
) -> ApiResult<ImportSummary> {
    let started_at = Utc::now();

    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook: Xlsx<_> = Xlsx::new(cursor)
        .map_err(|e| ApiError::BadRequest(format!("Not a readable workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut summary = ImportSummary::default();

    for spec in SHEETS {
        // Missing sheets are skipped silently; unknown sheets are ignored
        if !sheet_names.iter().any(|n| n == spec.name) {
            continue;
        }

        let range = workbook
            .worksheet_range(spec.name)
            .map_err(|e| ApiError::Internal(format!("Failed to read sheet {}: {}", spec.name, e)))?;

        let sheet_summary = import_sheet(pool, spec, &range).await?;

        summary.processed += sheet_summary.processed;
        summary.successful += sheet_summary.successful;
        summary.failed += sheet_summary.failed;
        summary.skipped += sheet_summary.skipped;
        summary.sheets.push(sheet_summary);
    }

    info!(
        "Import of {} finished: {} processed, {} successful, {} failed, {} skipped",
        filename, summary.processed, summary.successful, summary.failed, summary.skipped
    );

    let errors: Vec<&RowError> = summary.sheets.iter().flat_map(|s| s.errors.iter()).collect();
    let run = db::import_history::ImportRun {
        guid: Uuid::new_v4(),
        filename: filename.to_string(),
        started_at,
        ended_at: Some(Utc::now()),
        processed: summary.processed as i64,
        successful: summary.successful as i64,
        failed: summary.failed as i64,
        skipped: summary.skipped as i64,
        errors: serde_json::to_value(&errors)
            .map_err(|e| ApiError::Internal(format!("Serialize import errors: {}", e)))?,
        imported_by,
    };
    db::import_history::insert_run(pool, &run).await?;

    Ok(summary)
}

/// Import one sheet inside a transaction
pub async fn import_sheet(
    pool: &SqlitePool,
    spec: &SheetSpec,
    range: &calamine::Range<Data>,
) -> ApiResult<SheetSummary> {
    let mut summary = SheetSummary {
        sheet: spec.name.to_string(),
        processed: 0,
        successful: 0,
        failed: 0,
        skipped: 0,
        errors: Vec::new(),
    };

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(headers) => headers,
        None => return Ok(summary),
    };

    // Map column index -> declared field; unrecognized columns are ignored
    let mut column_fields: Vec<Option<(&'static str, FieldType)>> = Vec::new();
    for header in headers {
        let canonical = match header {
            Data::String(s) => canonical_field(s),
            Data::Empty => String::new(),
            other => canonical_field(&other.to_string()),
        };
        let field = spec
            .fields
            .iter()
            .find(|(name, _)| *name == canonical)
            .copied();
        column_fields.push(field);
    }

    let mut tx = pool.begin().await.map_err(paneltrack_common::Error::from)?;

    for (index, cells) in rows.enumerate() {
        // Header is spreadsheet row 1
        let row_number = index + 2;

        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        summary.processed += 1;

        // Coerce the declared columns; first bad cell fails the row
        let mut row: RowMap = HashMap::new();
        let mut coercion_error = None;
        for (cell, field) in cells.iter().zip(column_fields.iter()) {
            let Some(&(name, ty)) = field.as_ref() else { continue };
            match coerce(cell, ty) {
                Ok(Coerced::Null) => {}
                Ok(value) => {
                    row.insert(name, value);
                }
                Err(message) => {
                    coercion_error = Some(format!("column '{}': {}", name, message));
                    break;
                }
            }
        }

        if let Some(message) = coercion_error {
            summary.failed += 1;
            summary.errors.push(RowError {
                sheet: spec.name.to_string(),
                row: row_number,
                message,
            });
            continue;
        }

        match upsert_row(&mut tx, spec.name, &row).await {
            Ok(RowOutcome::Imported) => summary.successful += 1,
            Ok(RowOutcome::Skipped(message)) => {
                summary.skipped += 1;
                summary.errors.push(RowError {
                    sheet: spec.name.to_string(),
                    row: row_number,
                    message,
                });
            }
            Err(RowFailure::Invalid(message)) => {
                summary.failed += 1;
                summary.errors.push(RowError {
                    sheet: spec.name.to_string(),
                    row: row_number,
                    message,
                });
            }
            Err(RowFailure::Sql(err)) => {
                let common = paneltrack_common::Error::Database(err);
                if db::is_fk_violation(&common) {
                    summary.skipped += 1;
                    summary.errors.push(RowError {
                        sheet: spec.name.to_string(),
                        row: row_number,
                        message: "references a missing record".to_string(),
                    });
                } else {
                    summary.failed += 1;
                    summary.errors.push(RowError {
                        sheet: spec.name.to_string(),
                        row: row_number,
                        message: common.to_string(),
                    });
                }
            }
        }
    }

    tx.commit().await.map_err(paneltrack_common::Error::from)?;

    Ok(summary)
}

/// Why a row could not be upserted
enum RowFailure {
    /// Required value missing or out of range
    Invalid(String),
    Sql(sqlx::Error),
}

impl From<sqlx::Error> for RowFailure {
    fn from(err: sqlx::Error) -> Self {
        RowFailure::Sql(err)
    }
}

async fn upsert_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    sheet: &str,
    row: &RowMap,
) -> Result<RowOutcome, RowFailure> {
    match sheet {
        "Venues" => upsert_venue_row(tx, row).await,
        "Advisers" => upsert_adviser_row(tx, row).await,
        "Candidates" => upsert_candidate_row(tx, row).await,
        "Panels" => upsert_panel_row(tx, row).await,
        "Attendees" => upsert_attendee_row(tx, row).await,
        "Tasks" => upsert_task_row(tx, row).await,
        "Scores" => upsert_score_row(tx, row).await,
        "Candidate Records" => upsert_candidate_record_row(tx, row).await,
        other => Err(RowFailure::Invalid(format!("unknown sheet '{}'", other))),
    }
}

async fn upsert_venue_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &RowMap,
) -> Result<RowOutcome, RowFailure> {
    let name = text(row, "name").ok_or_else(|| RowFailure::Invalid("missing name".to_string()))?;

    db::venues::upsert_venue_by_name(
        &mut *tx,
        &name,
        text(row, "address").as_deref(),
        integer(row, "capacity"),
        text(row, "notes").as_deref(),
    )
    .await?;

    Ok(RowOutcome::Imported)
}

async fn upsert_adviser_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &RowMap,
) -> Result<RowOutcome, RowFailure> {
    let first_name =
        text(row, "first_name").ok_or_else(|| RowFailure::Invalid("missing first name".to_string()))?;
    let last_name =
        text(row, "last_name").ok_or_else(|| RowFailure::Invalid("missing last name".to_string()))?;

    let adviser = db::advisers::Adviser {
        guid: Uuid::new_v4(),
        first_name,
        last_name,
        email: text(row, "email"),
        quality: text(row, "quality"),
        phone: text(row, "phone"),
        notes: text(row, "notes"),
    };
    db::advisers::upsert_adviser_by_email(&mut *tx, &adviser).await?;

    Ok(RowOutcome::Imported)
}

async fn upsert_candidate_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &RowMap,
) -> Result<RowOutcome, RowFailure> {
    let first_name =
        text(row, "first_name").ok_or_else(|| RowFailure::Invalid("missing first name".to_string()))?;
    let last_name =
        text(row, "last_name").ok_or_else(|| RowFailure::Invalid("missing last name".to_string()))?;

    let candidate = db::candidates::Candidate {
        guid: Uuid::new_v4(),
        first_name,
        last_name,
        email: text(row, "email"),
        diocese: text(row, "diocese"),
        phone: text(row, "phone"),
        date_of_birth: date(row, "date_of_birth"),
        notes: text(row, "notes"),
    };
    db::candidates::upsert_candidate_by_email(&mut *tx, &candidate).await?;

    Ok(RowOutcome::Imported)
}

async fn upsert_panel_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &RowMap,
) -> Result<RowOutcome, RowFailure> {
    let name = text(row, "name").ok_or_else(|| RowFailure::Invalid("missing name".to_string()))?;
    let start_date =
        date(row, "start_date").ok_or_else(|| RowFailure::Invalid("missing start date".to_string()))?;
    let end_date = date(row, "end_date").unwrap_or(start_date);

    if end_date < start_date {
        return Err(RowFailure::Invalid("end date before start date".to_string()));
    }

    let panel_type = text(row, "panel_type").unwrap_or_else(|| "panel".to_string());
    if !db::panels::PANEL_TYPES.contains(&panel_type.as_str()) {
        return Err(RowFailure::Invalid(format!("unknown panel type '{}'", panel_type)));
    }

    let status = text(row, "status").unwrap_or_else(|| "planned".to_string());
    if !db::panels::PANEL_STATUSES.contains(&status.as_str()) {
        return Err(RowFailure::Invalid(format!("unknown status '{}'", status)));
    }

    let venue_guid = match text(row, "venue") {
        Some(venue_name) => match db::venues::find_venue_by_name_tx(&mut *tx, &venue_name).await? {
            Some(guid) => Some(guid),
            None => {
                return Ok(RowOutcome::Skipped(format!("unknown venue '{}'", venue_name)));
            }
        },
        None => None,
    };

    let panel = db::panels::Panel {
        guid: Uuid::new_v4(),
        name,
        panel_type,
        venue_guid,
        start_date,
        end_date,
        status,
        notes: text(row, "notes"),
    };
    db::panels::upsert_panel_by_name(&mut *tx, &panel).await?;

    Ok(RowOutcome::Imported)
}

async fn upsert_attendee_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &RowMap,
) -> Result<RowOutcome, RowFailure> {
    let panel_name =
        text(row, "panel").ok_or_else(|| RowFailure::Invalid("missing panel".to_string()))?;
    let Some(panel_guid) = db::panels::find_panel_by_name(&mut *tx, &panel_name).await? else {
        return Ok(RowOutcome::Skipped(format!("unknown panel '{}'", panel_name)));
    };

    let attendee_type = text(row, "attendee_type").unwrap_or_else(|| {
        if row.contains_key("adviser_email") {
            "adviser".to_string()
        } else {
            "candidate".to_string()
        }
    });
    if !db::attendees::ATTENDEE_TYPES.contains(&attendee_type.as_str()) {
        return Err(RowFailure::Invalid(format!(
            "unknown attendee type '{}'",
            attendee_type
        )));
    }

    let candidate_guid = match text(row, "candidate_email") {
        Some(email) => match db::candidates::find_candidate_by_email(&mut *tx, &email).await? {
            Some(guid) => Some(guid),
            None => {
                return Ok(RowOutcome::Skipped(format!("unknown candidate '{}'", email)));
            }
        },
        None => None,
    };

    let adviser_guid = match text(row, "adviser_email") {
        Some(email) => match db::advisers::find_adviser_by_email(&mut *tx, &email).await? {
            Some(guid) => Some(guid),
            None => {
                return Ok(RowOutcome::Skipped(format!("unknown adviser '{}'", email)));
            }
        },
        None => None,
    };

    if attendee_type != "secretary" && candidate_guid.is_none() && adviser_guid.is_none() {
        return Err(RowFailure::Invalid(
            "attendee row names neither candidate nor adviser".to_string(),
        ));
    }

    let attendee = db::attendees::Attendee {
        guid: Uuid::new_v4(),
        panel_guid,
        attendee_type,
        candidate_guid,
        adviser_guid,
        team: text(row, "team"),
        designation: text(row, "designation"),
    };
    db::attendees::upsert_attendee(&mut *tx, &attendee).await?;

    Ok(RowOutcome::Imported)
}

async fn upsert_task_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &RowMap,
) -> Result<RowOutcome, RowFailure> {
    let panel_name =
        text(row, "panel").ok_or_else(|| RowFailure::Invalid("missing panel".to_string()))?;
    let Some(panel_guid) = db::panels::find_panel_by_name(&mut *tx, &panel_name).await? else {
        return Ok(RowOutcome::Skipped(format!("unknown panel '{}'", panel_name)));
    };

    let title = text(row, "title").ok_or_else(|| RowFailure::Invalid("missing title".to_string()))?;

    let status = text(row, "status").unwrap_or_else(|| "pending".to_string());
    if !db::tasks::TASK_STATUSES.contains(&status.as_str()) {
        return Err(RowFailure::Invalid(format!("unknown status '{}'", status)));
    }

    let task = db::tasks::Task {
        guid: Uuid::new_v4(),
        panel_guid,
        template_guid: None,
        title,
        description: text(row, "description"),
        due_date: date(row, "due_date"),
        status,
        assigned_to: text(row, "assigned_to"),
        completed_at: None,
    };
    db::tasks::upsert_task_by_title(&mut *tx, &task).await?;

    Ok(RowOutcome::Imported)
}

async fn upsert_score_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &RowMap,
) -> Result<RowOutcome, RowFailure> {
    let panel_name =
        text(row, "panel").ok_or_else(|| RowFailure::Invalid("missing panel".to_string()))?;
    let Some(panel_guid) = db::panels::find_panel_by_name(&mut *tx, &panel_name).await? else {
        return Ok(RowOutcome::Skipped(format!("unknown panel '{}'", panel_name)));
    };

    let adviser_email = text(row, "adviser_email")
        .ok_or_else(|| RowFailure::Invalid("missing adviser".to_string()))?;
    let Some(adviser_guid) = db::advisers::find_adviser_by_email(&mut *tx, &adviser_email).await?
    else {
        return Ok(RowOutcome::Skipped(format!("unknown adviser '{}'", adviser_email)));
    };

    let candidate_email = text(row, "candidate_email")
        .ok_or_else(|| RowFailure::Invalid("missing candidate".to_string()))?;
    let Some(candidate_guid) =
        db::candidates::find_candidate_by_email(&mut *tx, &candidate_email).await?
    else {
        return Ok(RowOutcome::Skipped(format!(
            "unknown candidate '{}'",
            candidate_email
        )));
    };

    let subject =
        text(row, "subject").ok_or_else(|| RowFailure::Invalid("missing subject".to_string()))?;
    let value =
        integer(row, "score").ok_or_else(|| RowFailure::Invalid("missing score".to_string()))?;
    if !(1..=7).contains(&value) {
        return Err(RowFailure::Invalid(format!("score {} outside 1-7", value)));
    }

    let score = db::scores::Score {
        guid: Uuid::new_v4(),
        panel_guid,
        adviser_guid,
        candidate_guid,
        subject,
        score: value,
        notes: text(row, "notes"),
    };
    db::scores::upsert_score(&mut **tx, &score).await?;

    Ok(RowOutcome::Imported)
}

async fn upsert_candidate_record_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    row: &RowMap,
) -> Result<RowOutcome, RowFailure> {
    let candidate_email = text(row, "candidate_email")
        .ok_or_else(|| RowFailure::Invalid("missing candidate".to_string()))?;
    let Some(candidate_guid) =
        db::candidates::find_candidate_by_email(&mut *tx, &candidate_email).await?
    else {
        return Ok(RowOutcome::Skipped(format!(
            "unknown candidate '{}'",
            candidate_email
        )));
    };

    let record_type = text(row, "record_type")
        .ok_or_else(|| RowFailure::Invalid("missing record type".to_string()))?;

    let status = text(row, "status").unwrap_or_else(|| "pending".to_string());
    if !db::candidate_records::RECORD_STATUSES.contains(&status.as_str()) {
        return Err(RowFailure::Invalid(format!("unknown status '{}'", status)));
    }

    let record = db::candidate_records::CandidateRecord {
        guid: Uuid::new_v4(),
        candidate_guid,
        record_type,
        status,
        completed_at: None,
        notes: text(row, "notes"),
    };
    db::candidate_records::upsert_record(&mut **tx, &record).await?;

    Ok(RowOutcome::Imported)
}
