//! Report, analytics, and calendar feed integration tests

mod helpers;

use axum::http::StatusCode;
use helpers::{login, request, request_raw, test_app};
use serde_json::json;

struct Fixture {
    panel_guid: String,
    candidate_guid: String,
}

/// Seed one panel with a candidate, an adviser, a score, tasks, records
/// and a print item through the public API
async fn seed(app: &axum::Router, cookie: &str) -> Fixture {
    let (_s, venue) = request(
        app,
        "POST",
        "/api/venues",
        Some(cookie),
        Some(json!({ "name": "St Anselm House" })),
    )
    .await;

    let (_s, panel) = request(
        app,
        "POST",
        "/api/panels",
        Some(cookie),
        Some(json!({
            "name": "March Panel",
            "panel_type": "panel",
            "venue_guid": venue["guid"],
            "start_date": "2026-03-02",
            "end_date": "2026-03-04",
            "status": "confirmed",
            "notes": "Spring cohort"
        })),
    )
    .await;
    let panel_guid = panel["guid"].as_str().unwrap().to_string();

    let (_s, candidate) = request(
        app,
        "POST",
        "/api/candidates",
        Some(cookie),
        Some(json!({
            "first_name": "Sam",
            "last_name": "Price",
            "email": "sam@example.org",
            "diocese": "Oxford"
        })),
    )
    .await;
    let candidate_guid = candidate["guid"].as_str().unwrap().to_string();

    let (_s, adviser) = request(
        app,
        "POST",
        "/api/advisers",
        Some(cookie),
        Some(json!({
            "first_name": "Joan",
            "last_name": "Reid",
            "email": "joan@example.org",
            "quality": "Vocation"
        })),
    )
    .await;
    let adviser_guid = adviser["guid"].as_str().unwrap().to_string();

    request(
        app,
        "POST",
        &format!("/api/panels/{}/attendees", panel_guid),
        Some(cookie),
        Some(json!({ "attendee_type": "candidate", "candidate_guid": candidate_guid, "team": "A" })),
    )
    .await;
    request(
        app,
        "POST",
        &format!("/api/panels/{}/attendees", panel_guid),
        Some(cookie),
        Some(json!({ "attendee_type": "adviser", "adviser_guid": adviser_guid })),
    )
    .await;

    for (subject, score) in [("Vocation", 5), ("Ministry", 6)] {
        request(
            app,
            "PUT",
            &format!("/api/panels/{}/scores", panel_guid),
            Some(cookie),
            Some(json!({
                "adviser_guid": adviser_guid,
                "candidate_guid": candidate_guid,
                "subject": subject,
                "score": score
            })),
        )
        .await;
    }

    for (title, status) in [("Book venue", "done"), ("Print papers", "pending")] {
        let (_s, task) = request(
            app,
            "POST",
            &format!("/api/panels/{}/tasks", panel_guid),
            Some(cookie),
            Some(json!({ "title": title, "status": "pending", "due_date": "2026-02-01" })),
        )
        .await;
        if status == "done" {
            request(
                app,
                "PUT",
                &format!("/api/panels/{}/tasks/{}", panel_guid, task["guid"].as_str().unwrap()),
                Some(cookie),
                Some(json!({ "title": title, "status": "done" })),
            )
            .await;
        }
    }

    for (record_type, status) in [("references", "verified"), ("safeguarding_training", "pending")] {
        request(
            app,
            "PUT",
            &format!("/api/candidates/{}/records", candidate_guid),
            Some(cookie),
            Some(json!({ "record_type": record_type, "status": status })),
        )
        .await;
    }

    request(
        app,
        "POST",
        &format!("/api/panels/{}/print-items", panel_guid),
        Some(cookie),
        Some(json!({ "item_name": "Candidate packs", "quantity": 16 })),
    )
    .await;

    Fixture {
        panel_guid,
        candidate_guid,
    }
}

#[tokio::test]
async fn roster_groups_attendees_by_type() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;
    let fixture = seed(&app, &cookie).await;

    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/reports/panels/{}/roster", fixture.panel_guid),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["panel"]["name"], "March Panel");
    assert_eq!(body["candidates"].as_array().unwrap().len(), 1);
    assert_eq!(body["advisers"].as_array().unwrap().len(), 1);
    assert_eq!(body["candidates"][0]["display_name"], "Sam Price");
    assert_eq!(body["secretaries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn print_checklist_counts_outstanding_items() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;
    let fixture = seed(&app, &cookie).await;

    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/reports/panels/{}/print-checklist", fixture.panel_guid),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["printed"], 0);
    assert_eq!(body["outstanding"], 1);
}

#[tokio::test]
async fn candidate_summary_joins_scores_and_records() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;
    let fixture = seed(&app, &cookie).await;

    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/reports/candidates/{}/summary", fixture.candidate_guid),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["candidate"]["email"], "sam@example.org");
    assert_eq!(body["records"].as_array().unwrap().len(), 2);

    let scores = body["scores"].as_array().unwrap();
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0]["adviser_name"], "Joan Reid");
    assert_eq!(scores[0]["panel_name"], "March Panel");
}

#[tokio::test]
async fn analytics_overview_counts_the_fixture() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;
    seed(&app, &cookie).await;

    let (status, body) = request(&app, "GET", "/api/analytics/overview", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["candidates"], 1);
    assert_eq!(body["advisers"], 1);
    assert_eq!(body["panels_by_type"][0]["key"], "panel");
    assert_eq!(body["panels_by_type"][0]["count"], 1);
}

#[tokio::test]
async fn analytics_shapes_are_zeroed_on_empty_database() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;

    let (status, body) = request(&app, "GET", "/api/analytics/overview", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["candidates"], 0);
    assert_eq!(body["upcoming_panels"], 0);
    assert!(body["panels_by_type"].as_array().unwrap().is_empty());

    let (status, body) = request(&app, "GET", "/api/analytics/scores", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["panel_subject_averages"].as_array().unwrap().is_empty());

    let (status, body) = request(&app, "GET", "/api/analytics/tasks", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn analytics_scores_and_tasks_aggregate() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;
    seed(&app, &cookie).await;

    let (status, body) = request(&app, "GET", "/api/analytics/scores", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let averages = body["panel_subject_averages"].as_array().unwrap();
    assert_eq!(averages.len(), 2);
    let spreads = body["adviser_spreads"].as_array().unwrap();
    assert_eq!(spreads.len(), 1);
    assert_eq!(spreads[0]["adviser_name"], "Joan Reid");
    assert_eq!(spreads[0]["min_score"], 5);
    assert_eq!(spreads[0]["max_score"], 6);

    let (status, body) = request(&app, "GET", "/api/analytics/tasks", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = body.as_array().unwrap();
    assert_eq!(stats[0]["total"], 2);
    assert_eq!(stats[0]["done"], 1);
    assert_eq!(stats[0]["completion_rate"], 0.5);

    let (status, body) = request(&app, "GET", "/api/analytics/candidates", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let progress = body.as_array().unwrap();
    assert_eq!(progress[0]["total_records"], 2);
    assert_eq!(progress[0]["verified_records"], 1);
}

#[tokio::test]
async fn calendar_feed_renders_the_panel() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;
    let fixture = seed(&app, &cookie).await;

    // A cancelled panel must not appear
    request(
        &app,
        "POST",
        "/api/panels",
        Some(&cookie),
        Some(json!({
            "name": "Cancelled Carousel",
            "panel_type": "carousel",
            "start_date": "2026-05-01",
            "end_date": "2026-05-01",
            "status": "cancelled"
        })),
    )
    .await;

    let (status, content_type, bytes) =
        request_raw(&app, "GET", "/api/calendar/panels.ics", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/calendar"));

    let feed = String::from_utf8(bytes).unwrap();
    assert!(feed.contains("BEGIN:VCALENDAR"));
    assert!(feed.contains(&format!("UID:{}@paneltrack", fixture.panel_guid)));
    assert!(feed.contains("DTSTART;VALUE=DATE:20260302"));
    assert!(feed.contains("DTEND;VALUE=DATE:20260305"));
    assert!(feed.contains("LOCATION:St Anselm House"));
    assert!(!feed.contains("Cancelled Carousel"));
}
