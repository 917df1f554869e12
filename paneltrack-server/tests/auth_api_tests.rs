//! Authentication and user administration integration tests

mod helpers;

use axum::http::StatusCode;
use helpers::{login, request, test_app};
use serde_json::json;

#[tokio::test]
async fn login_then_me_round_trip() {
    let (app, _state) = test_app().await;

    let cookie = login(&app, "admin", "admin").await;

    let (status, body) = request(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn wrong_credentials_are_401() {
    let (app, _state) = test_app().await;

    for (username, password) in [("admin", "wrong"), ("nobody", "admin")] {
        let (status, body) = request(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        // Same message either way; no user enumeration
        assert_eq!(
            body["error"]["message"],
            "Invalid username or password"
        );
    }
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let (app, _state) = test_app().await;

    let cookie = login(&app, "admin", "admin").await;

    let (status, _body) = request(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    // The cookie still decodes but its session row is gone
    let (status, _body) = request(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_admin_cannot_manage_users() {
    let (app, _state) = test_app().await;

    let admin_cookie = login(&app, "admin", "admin").await;
    let (status, _body) = request(
        &app,
        "POST",
        "/api/users",
        Some(&admin_cookie),
        Some(json!({
            "username": "secretary",
            "password": "pw",
            "display_name": "Panel Secretary",
            "role": "user"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let user_cookie = login(&app, "secretary", "pw").await;

    let (status, body) = request(&app, "GET", "/api/users", Some(&user_cookie), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    // But ordinary resources are open to them
    let (status, _body) = request(&app, "GET", "/api/panels", Some(&user_cookie), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_username_is_409() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;

    let payload = json!({
        "username": "secretary",
        "password": "pw",
        "role": "user"
    });
    let (status, _body) =
        request(&app, "POST", "/api/users", Some(&cookie), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(&app, "POST", "/api/users", Some(&cookie), Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn password_change_takes_effect() {
    let (app, _state) = test_app().await;
    let admin_cookie = login(&app, "admin", "admin").await;

    let (status, created) = request(
        &app,
        "POST",
        "/api/users",
        Some(&admin_cookie),
        Some(json!({ "username": "u", "password": "old", "role": "user" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let guid = created["guid"].as_str().unwrap().to_string();

    let (status, _body) = request(
        &app,
        "PUT",
        &format!("/api/users/{}/password", guid),
        Some(&admin_cookie),
        Some(json!({ "password": "new" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works, new one does
    let (status, _body) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "u", "password": "old" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    login(&app, "u", "new").await;
}

#[tokio::test]
async fn deleting_a_user_kills_their_sessions() {
    let (app, _state) = test_app().await;
    let admin_cookie = login(&app, "admin", "admin").await;

    let (_status, created) = request(
        &app,
        "POST",
        "/api/users",
        Some(&admin_cookie),
        Some(json!({ "username": "temp", "password": "pw", "role": "user" })),
    )
    .await;
    let guid = created["guid"].as_str().unwrap().to_string();

    let temp_cookie = login(&app, "temp", "pw").await;

    let (status, _body) = request(
        &app,
        "DELETE",
        &format!("/api/users/{}", guid),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _body) = request(&app, "GET", "/api/auth/me", Some(&temp_cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_cannot_delete_self() {
    let (app, _state) = test_app().await;
    let cookie = login(&app, "admin", "admin").await;

    let (_status, me) = request(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    let guid = me["guid"].as_str().unwrap().to_string();

    let (status, _body) = request(
        &app,
        "DELETE",
        &format!("/api/users/{}", guid),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
