//! Import pipeline integration tests
//!
//! Sheet-level tests build calamine ranges directly; endpoint tests
//! drive the multipart route.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use calamine::{Data, Range};
use chrono::Utc;
use helpers::{login, request, test_app};
use http_body_util::BodyExt;
use paneltrack_server::import::{import_sheet, run_import, sheet_spec};
use paneltrack_server::{db, ApiError};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

fn s(text: &str) -> Data {
    Data::String(text.to_string())
}

fn range_of(rows: Vec<Vec<Data>>) -> Range<Data> {
    let max_cols = rows.iter().map(|r| r.len()).max().unwrap_or(1);
    let mut range = Range::new((0, 0), ((rows.len() - 1) as u32, (max_cols - 1) as u32));
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !matches!(cell, Data::Empty) {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
    }
    range
}

#[tokio::test]
async fn venues_sheet_upserts_on_name() {
    let (_app, state) = test_app().await;
    let spec = sheet_spec("Venues").unwrap();

    let rows = vec![
        vec![s("Name"), s("Address"), s("Capacity"), s("Notes")],
        vec![s("St Anselm House"), s("12 College Way"), Data::Float(40.0), Data::Empty],
        vec![s("Launde Abbey"), Data::Empty, Data::Int(24), s("Quiet wing only")],
    ];
    let summary = import_sheet(&state.db, spec, &range_of(rows.clone())).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 0);

    // Second run updates rather than duplicates
    let summary = import_sheet(&state.db, spec, &range_of(rows)).await.unwrap();
    assert_eq!(summary.successful, 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM venues")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn header_normalization_handles_human_headers() {
    let (_app, state) = test_app().await;
    let spec = sheet_spec("Candidates").unwrap();

    // Exception-table headers: Forename, Surname, E-mail Address, DOB
    let rows = vec![
        vec![s("Forename"), s("Surname"), s("E-mail Address"), s("DOB"), s("Diocese")],
        vec![s("Sam"), s("Price"), s("sam@example.org"), s("02/03/1994"), s("Oxford")],
    ];
    let summary = import_sheet(&state.db, spec, &range_of(rows)).await.unwrap();
    assert_eq!(summary.successful, 1, "errors: {:?}", summary.errors);

    let dob: String = sqlx::query_scalar(
        "SELECT date_of_birth FROM candidates WHERE email = 'sam@example.org'",
    )
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(dob, "1994-03-02");
}

#[tokio::test]
async fn serial_dates_convert_on_import() {
    let (_app, state) = test_app().await;
    let spec = sheet_spec("Panels").unwrap();

    // 46083 = 2026-03-02 in the 1899-12-30 serial system
    let rows = vec![
        vec![s("Name"), s("Panel Type"), s("Start Date"), s("End Date")],
        vec![s("March Panel"), s("panel"), Data::Float(46083.0), Data::Float(46085.0)],
    ];
    let summary = import_sheet(&state.db, spec, &range_of(rows)).await.unwrap();
    assert_eq!(summary.successful, 1, "errors: {:?}", summary.errors);

    let (start, end): (String, String) =
        sqlx::query_as("SELECT start_date, end_date FROM panels WHERE name = 'March Panel'")
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(start, "2026-03-02");
    assert_eq!(end, "2026-03-04");
}

#[tokio::test]
async fn scores_sheet_skips_unknown_parents_and_commits_the_rest() {
    let (_app, state) = test_app().await;

    // Seed the parents the good row needs
    let panel_guid = Uuid::new_v4();
    sqlx::query("INSERT INTO panels (guid, name, panel_type, start_date, end_date) VALUES (?, 'March Panel', 'panel', '2026-03-02', '2026-03-04')")
        .bind(panel_guid.to_string())
        .execute(&state.db)
        .await
        .unwrap();
    sqlx::query("INSERT INTO advisers (guid, first_name, last_name, email) VALUES (?, 'Joan', 'Reid', 'joan@example.org')")
        .bind(Uuid::new_v4().to_string())
        .execute(&state.db)
        .await
        .unwrap();
    sqlx::query("INSERT INTO candidates (guid, first_name, last_name, email) VALUES (?, 'Sam', 'Price', 'sam@example.org')")
        .bind(Uuid::new_v4().to_string())
        .execute(&state.db)
        .await
        .unwrap();

    let spec = sheet_spec("Scores").unwrap();
    let rows = vec![
        vec![s("Panel"), s("Adviser"), s("Candidate"), s("Subject"), s("Score")],
        // Good row
        vec![s("March Panel"), s("joan@example.org"), s("sam@example.org"), s("Vocation"), Data::Int(5)],
        // Unknown candidate: skipped, not fatal
        vec![s("March Panel"), s("joan@example.org"), s("ghost@example.org"), s("Vocation"), Data::Int(4)],
        // Score out of range: failed
        vec![s("March Panel"), s("joan@example.org"), s("sam@example.org"), s("Ministry"), Data::Int(9)],
    ];

    let summary = import_sheet(&state.db, spec, &range_of(rows)).await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors.len(), 2);

    // The good row committed despite the bad ones
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM adviser_candidate_scores")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn coercion_failure_is_recorded_per_row() {
    let (_app, state) = test_app().await;
    let spec = sheet_spec("Venues").unwrap();

    let rows = vec![
        vec![s("Name"), s("Capacity")],
        vec![s("St Anselm House"), s("lots")],
        vec![s("Launde Abbey"), Data::Int(24)],
    ];
    let summary = import_sheet(&state.db, spec, &range_of(rows)).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.errors[0].row, 2);
    assert!(summary.errors[0].message.contains("capacity"));
}

#[tokio::test]
async fn empty_rows_and_unknown_columns_are_ignored() {
    let (_app, state) = test_app().await;
    let spec = sheet_spec("Venues").unwrap();

    let rows = vec![
        vec![s("Name"), s("Shoe Size")],
        vec![Data::Empty, Data::Empty],
        vec![s("St Anselm House"), Data::Int(9)],
    ];
    let summary = import_sheet(&state.db, spec, &range_of(rows)).await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.successful, 1);
}

#[tokio::test]
async fn garbage_workbook_is_bad_request() {
    let (_app, state) = test_app().await;

    let result = run_import(&state.db, b"definitely not a zip", "junk.xlsx", None).await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));
}

#[tokio::test]
async fn import_endpoint_rejects_bad_uploads() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;

    let boundary = "X-PANELTRACK-TEST";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"junk.xlsx\"\r\nContent-Type: application/octet-stream\r\n\r\nnot a workbook\r\n--{b}--\r\n",
        b = boundary
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import")
                .header(header::COOKIE, &cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"]["code"], "BAD_REQUEST");

    // Missing file field entirely
    let body = format!("--{b}--\r\n", b = boundary);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import")
                .header(header::COOKIE, &cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn import_history_lists_runs_newest_first() {
    let (app, state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;

    for (name, offset_minutes) in [("first.xlsx", 10), ("second.xlsx", 5)] {
        let run = db::import_history::ImportRun {
            guid: Uuid::new_v4(),
            filename: name.to_string(),
            started_at: Utc::now() - chrono::Duration::minutes(offset_minutes),
            ended_at: Some(Utc::now()),
            processed: 4,
            successful: 3,
            failed: 1,
            skipped: 0,
            errors: json!([]),
            imported_by: Some("admin".to_string()),
        };
        db::import_history::insert_run(&state.db, &run).await.unwrap();
    }

    let (status, body) = request(&app, "GET", "/api/import/history", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let runs = body.as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["filename"], "second.xlsx");
    assert_eq!(runs[1]["filename"], "first.xlsx");
}
