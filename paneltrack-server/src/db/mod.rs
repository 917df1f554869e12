//! Database access for paneltrack-server
//!
//! One module per resource; each exposes a row struct plus free async
//! functions over `&SqlitePool`.

pub mod advisers;
pub mod attendees;
pub mod candidate_records;
pub mod candidates;
pub mod import_history;
pub mod panels;
pub mod print_items;
pub mod scores;
pub mod sessions;
pub mod tasks;
pub mod users;
pub mod venues;
pub mod worship;

use paneltrack_common::{Error, Result};
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool and schema
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    paneltrack_common::db::init::init_database(db_path).await
}

/// True when the error is a SQLite unique-constraint violation
pub fn is_unique_violation(err: &Error) -> bool {
    database_error_kind(err)
        .map(|kind| matches!(kind, sqlx::error::ErrorKind::UniqueViolation))
        .unwrap_or(false)
}

/// True when the error is a SQLite foreign-key violation
pub fn is_fk_violation(err: &Error) -> bool {
    database_error_kind(err)
        .map(|kind| matches!(kind, sqlx::error::ErrorKind::ForeignKeyViolation))
        .unwrap_or(false)
}

/// True when the error is a CHECK constraint violation (closed enums)
pub fn is_check_violation(err: &Error) -> bool {
    database_error_kind(err)
        .map(|kind| matches!(kind, sqlx::error::ErrorKind::CheckViolation))
        .unwrap_or(false)
}

fn database_error_kind(err: &Error) -> Option<sqlx::error::ErrorKind> {
    match err {
        Error::Database(db_err) => db_err.as_database_error().map(|d| d.kind()),
        _ => None,
    }
}
