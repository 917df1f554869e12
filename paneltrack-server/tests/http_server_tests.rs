//! HTTP server and routing integration tests

mod helpers;

use axum::http::StatusCode;
use helpers::{request, test_app};

#[tokio::test]
async fn health_check_is_public() {
    let (app, _state) = test_app().await;

    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "paneltrack-server");
    assert!(body["uptime_seconds"].is_number());
}

#[tokio::test]
async fn api_routes_require_authentication() {
    let (app, _state) = test_app().await;

    for uri in [
        "/api/panels",
        "/api/candidates",
        "/api/advisers",
        "/api/venues",
        "/api/users",
        "/api/analytics/overview",
        "/api/import/history",
        "/api/calendar/panels.ics",
    ] {
        let (status, body) = request(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} should be guarded", uri);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _state) = test_app().await;

    let (status, _body) = request(&app, "GET", "/api/nonsense", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn garbage_cookie_is_rejected() {
    let (app, _state) = test_app().await;

    let (status, _body) = request(
        &app,
        "GET",
        "/api/panels",
        Some("paneltrack_session=not.a.token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
