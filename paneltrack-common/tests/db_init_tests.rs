//! Tests for database initialization
//!
//! Covers automatic database creation, idempotent re-initialization,
//! default settings, and the seeded admin user.

use paneltrack_common::db::init::{create_all_tables, init_database};
use sqlx::SqlitePool;
use tempfile::tempdir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("paneltrack.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());

    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("paneltrack.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    // Second init must be a no-op open, not an error
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("paneltrack.db");
    let pool = init_database(&db_path).await.unwrap();

    let ttl: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'session_ttl_hours'")
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert_eq!(ttl.as_deref(), Some("24"));
}

#[tokio::test]
async fn test_admin_user_seeded_once() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("paneltrack.db");

    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
    drop(pool);

    // Re-init must not add a second admin
    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_score_uniqueness_constraint() {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await.unwrap();
    create_all_tables(&pool).await.unwrap();

    sqlx::query("INSERT INTO panels (guid, name, panel_type, start_date, end_date) VALUES ('p1', 'Panel', 'panel', '2026-03-02', '2026-03-04')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO advisers (guid, first_name, last_name) VALUES ('a1', 'Joan', 'Reid')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO candidates (guid, first_name, last_name) VALUES ('c1', 'Sam', 'Price')")
        .execute(&pool)
        .await
        .unwrap();

    let insert = "INSERT INTO adviser_candidate_scores (guid, panel_guid, adviser_guid, candidate_guid, subject, score) VALUES (?, 'p1', 'a1', 'c1', 'Vocation', 5)";
    sqlx::query(insert).bind("s1").execute(&pool).await.unwrap();

    // Same adviser/candidate/subject/panel tuple must be rejected
    let dup = sqlx::query(insert).bind("s2").execute(&pool).await;
    assert!(dup.is_err());
}

#[tokio::test]
async fn test_attendee_foreign_keys_enforced() {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await.unwrap();
    create_all_tables(&pool).await.unwrap();

    // No such panel
    let result = sqlx::query(
        "INSERT INTO panel_attendees (guid, panel_guid, attendee_type) VALUES ('x', 'missing', 'secretary')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err());
}
