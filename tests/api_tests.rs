//! API tests against the full router with an in-memory store

mod common;

use axum::{
    extract::Extension,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use chrono::Duration;
use serde_json::json;
use tokio_test::assert_ok;

use bookstore_server::auth::{check_access, AccessGrant, Clock};
use common::TestApp;

const BOOK_ID: &str = "3f1c2a9e-8d4b-4c6a-9b2e-7a5d1e0f4c3b";

/// Protected router whose handlers only echo what the middleware decided,
/// nested the same way as the real entity routes
fn echo_router(app: &TestApp) -> Router {
    async fn echo(Extension(grant): Extension<AccessGrant>) -> String {
        format!("{{\"endpoint\":\"{}\"}}", grant.endpoint)
    }

    let protected = Router::new()
        .route("/books", get(echo))
        .route("/books/:id", get(echo).put(echo))
        .route_layer(from_fn_with_state(app.state.access.clone(), check_access));

    Router::new().nest("/api/v1", protected)
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_register_assigns_guest_role() {
    let app = TestApp::new();

    let (user_id, _) = app.sign_up("reader", "long-enough").await;

    assert_eq!(app.store.roles_of(user_id), vec![app.store.role_id("guest")]);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new();
    app.sign_up("reader", "long-enough").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/register",
            None,
            Some(json!({ "username": "reader", "password": "long-enough" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "conflict");

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/register",
            None,
            Some(json!({ "username": "ab", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_401() {
    let app = TestApp::new();
    app.sign_up("reader", "long-enough").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "username": "reader", "password": "not-the-one" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_granted_request_is_allowed() {
    let app = TestApp::new();
    app.store.grant("guest", "/books/{id}", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    let (status, body) = TestApp::send_to(
        echo_router(&app),
        "GET",
        &format!("/api/v1/books/{}", BOOK_ID),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoint"], "/books/{id}");
}

#[tokio::test]
async fn test_allowed_request_reaches_entity_handler() {
    let app = TestApp::new();
    app.store.grant("guest", "/books", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    // The handler runs and fails on the unreachable database, not on access
    let (status, body) = app.send("GET", "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database error");
}

#[tokio::test]
async fn test_expired_token_is_401() {
    let app = TestApp::new();
    app.store.grant("guest", "/books", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    app.clock.advance(Duration::hours(25));

    let (status, _) = TestApp::send_to(echo_router(&app), "GET", "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_grant_is_403() {
    let app = TestApp::new();
    app.store.grant("guest", "/books/{id}", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/v1/books/{}", BOOK_ID),
            Some(&token),
            Some(json!({ "title": "Renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "forbidden");
}

#[tokio::test]
async fn test_deactivated_grant_denies_without_deleting() {
    let app = TestApp::new();
    app.store.grant("guest", "/books", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    let (status, _) = TestApp::send_to(echo_router(&app), "GET", "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    app.store.set_grant_active("guest", "/books", "GET", false);

    let (status, _) = TestApp::send_to(echo_router(&app), "GET", "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.grant_count(), 1);
}

#[tokio::test]
async fn test_grant_store_failure_is_500() {
    let app = TestApp::new();
    app.store.grant("guest", "/books", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    app.store.fail_grant_lookups();

    let (status, body) = TestApp::send_to(echo_router(&app), "GET", "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Service temporarily unavailable");
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let app = TestApp::new();
    app.store.grant("guest", "/books", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    let (status, _) = app.send("POST", "/api/v1/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.session_count(), 0);

    // Still a well-formed, unexpired token, but its session is gone
    assert!(app.state.access.tokens().verify_token(&token).is_ok());

    let (status, body) = TestApp::send_to(echo_router(&app), "GET", "/api/v1/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Session expired, login again");
}

#[tokio::test]
async fn test_logout_keeps_other_sessions() {
    let app = TestApp::new();
    app.store.grant("guest", "/books", "GET");
    let (_, first) = app.sign_up("reader", "long-enough").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "username": "reader", "password": "long-enough" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["data"]["access_token"].as_str().unwrap().to_string();
    assert_eq!(app.store.session_count(), 2);

    app.send("POST", "/api/v1/logout", Some(&first), None).await;

    let (status, _) = TestApp::send_to(echo_router(&app), "GET", "/api/v1/books", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_session_revocation_is_independent_of_token_validity() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("reader", "long-enough").await;
    let sessions = app.state.access.sessions();

    assert!(sessions.session_active(&token).await.unwrap());

    assert_ok!(sessions.revoke_session(&token).await);
    assert_ok!(sessions.revoke_session(&token).await);

    assert!(!sessions.session_active(&token).await.unwrap());
    assert_ok!(app.state.access.tokens().verify_token(&token));
}

#[tokio::test]
async fn test_session_expires_with_clock() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("reader", "long-enough").await;
    let sessions = app.state.access.sessions();

    app.clock.advance(Duration::hours(23));
    assert!(sessions.session_active(&token).await.unwrap());

    app.clock.advance(Duration::hours(1));
    assert!(!sessions.session_active(&token).await.unwrap());
    assert!(app.clock.now() > chrono::Utc::now());
}

#[tokio::test]
async fn test_protected_routes_require_bearer_header() {
    let app = TestApp::new();

    let (status, _) = app.send("GET", "/api/v1/books", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("POST", "/api/v1/logout", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    let (_, token) = app.sign_up("reader", "long-enough").await;

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/change-password",
            Some(&token),
            Some(json!({
                "current_password": "long-enough",
                "new_password": "even-longer-one",
                "confirm_password": "does-not-match"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/change-password",
            Some(&token),
            Some(json!({
                "current_password": "long-enough",
                "new_password": "even-longer-one",
                "confirm_password": "even-longer-one"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "username": "reader", "password": "even-longer-one" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = TestApp::new();
    app.sign_up("reader", "long-enough").await;

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/request-reset-password",
            None,
            Some(json!({ "username": "nobody" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/request-reset-password",
            None,
            Some(json!({ "username": "reader" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let encoded: String = token
        .chars()
        .map(|c| match c {
            '=' => "%3D".to_string(),
            other => other.to_string(),
        })
        .collect();

    let (status, _) = app
        .send("GET", &format!("/api/v1/validate-reset-token?token={}", encoded), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/reset-password",
            None,
            Some(json!({ "token": token, "new_password": "fresh-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Spent
    let (status, _) = app
        .send("GET", &format!("/api/v1/validate-reset-token?token={}", encoded), None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "username": "reader", "password": "fresh-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_token_expires() {
    let app = TestApp::new();
    app.sign_up("reader", "long-enough").await;

    let (_, body) = app
        .send(
            "POST",
            "/api/v1/request-reset-password",
            None,
            Some(json!({ "username": "reader" })),
        )
        .await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    app.clock.advance(Duration::minutes(6));

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/reset-password",
            None,
            Some(json!({ "token": token, "new_password": "fresh-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_register_answers_200_with_user() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/register",
            None,
            Some(json!({ "username": "alice", "password": "Secret123!" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn test_login_expires_24_hours_after_issuance() {
    let app = TestApp::new();
    app.sign_up("reader", "long-enough").await;

    let issued_at = app.clock.now();
    let (status, body) = app
        .send(
            "POST",
            "/api/v1/login",
            None,
            Some(json!({ "username": "reader", "password": "long-enough" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["expires_at"].as_i64(),
        Some((issued_at + Duration::hours(24)).timestamp())
    );
}

#[tokio::test]
async fn test_expired_token_on_roles_is_401() {
    let app = TestApp::new();
    app.store.grant("guest", "/roles", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    // Access passes; the handler then fails on the unreachable database
    let (status, _) = app.send("GET", "/api/v1/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    app.clock.advance(Duration::hours(25));

    let (status, body) = app.send("GET", "/api/v1/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "unauthorized");
}

#[tokio::test]
async fn test_roles_after_logout_is_401() {
    let app = TestApp::new();
    app.store.grant("guest", "/roles", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    let (status, _) = app.send("GET", "/api/v1/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = app.send("POST", "/api/v1/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", "/api/v1/roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Session expired, login again");
}

#[tokio::test]
async fn test_malformed_list_parameters_use_error_envelope() {
    let app = TestApp::new();
    app.store.grant("guest", "/books", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    let (status, body) = app
        .send("GET", "/api/v1/books?limit=ten", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "bad request");
    assert!(body["error"].is_string());

    let (status, body) = app
        .send("GET", "/api/v1/books?offset=-x", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "bad request");
}

#[tokio::test]
async fn test_non_uuid_id_uses_error_envelope() {
    let app = TestApp::new();
    app.store.grant("guest", "/books/not-a-uuid", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    let (status, body) = app
        .send("GET", "/api/v1/books/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "bad request");
}

#[tokio::test]
async fn test_date_window_validation() {
    let app = TestApp::new();
    app.store.grant("guest", "/authors", "GET");
    app.store.grant("guest", "/loans", "GET");
    let (_, token) = app.sign_up("reader", "long-enough").await;

    let (status, body) = app
        .send(
            "GET",
            "/api/v1/authors?start_date=01-03-2024&end_date=2024-03-31",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "bad request");

    let (status, body) = app
        .send(
            "GET",
            "/api/v1/loans?start_date=2024-03-31&end_date=2024-03-01",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "start_date must not be after end_date");

    // A well-formed window passes validation and reaches the database
    let (status, _) = app
        .send(
            "GET",
            "/api/v1/authors?start_date=2024-03-01&end_date=2024-03-31",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_validate_reset_token_requires_token() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/api/v1/validate-reset-token", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "bad request");
}
