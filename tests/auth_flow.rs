//! Login, token issuance and per-request authentication over HTTP

mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{get_with_header, json_request, tamper_signature, TestApp, PASSWORD};
use user_service::auth::{JwtHandler, Role};

#[tokio::test]
async fn test_login_issues_token() {
    let app = TestApp::new();
    app.seed_user("alice@x.com", Role::User, true);

    let (status, body) = app.login("alice@x.com", PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@x.com");
    assert_eq!(body["role"], "USER");
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["expires_in"], 86400);

    let token = body["token"].as_str().unwrap();
    let claims = app.state.jwt_handler.validate_token(token).unwrap();
    assert_eq!(claims.sub, "alice@x.com");
    assert_eq!(claims.role, Role::User);
    assert_eq!(claims.exp - claims.iat, 86400);
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_look_identical() {
    let app = TestApp::new();
    app.seed_user("alice@x.com", Role::User, true);

    let (unknown_status, unknown_body) = app.login("nobody@x.com", PASSWORD).await;
    let (wrong_status, wrong_body) = app.login("alice@x.com", "not-the-password").await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_body["message"], "Invalid email or password");
    assert_eq!(unknown_body["message"], wrong_body["message"]);
    assert_eq!(unknown_body["error"], wrong_body["error"]);
    assert!(unknown_body.get("token").is_none());
}

#[tokio::test]
async fn test_inactive_account_is_distinct() {
    let app = TestApp::new();
    app.seed_user("bob@x.com", Role::User, false);

    let (status, body) = app.login("bob@x.com", PASSWORD).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Account is inactive");

    // Password is checked before the active flag
    let (status, body) = app.login("bob@x.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_validation() {
    let app = TestApp::new();

    let (status, body) = app.login("not-an-email", "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["errors"]["email"].is_string());
    assert_eq!(body["errors"]["password"], "Password is required");
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(Method::GET, "/api/auth/me", None, None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let (status, _) = app
        .send(get_with_header("/api/auth/me", "Basic YWxpY2U6c2VjcmV0"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_valid_token() {
    let app = TestApp::new();
    app.seed_user("admin@x.com", Role::Admin, true);
    let token = app.token_for("admin@x.com").await;

    let (status, body) = app
        .send(json_request(Method::GET, "/api/auth/me", None, Some(&token)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "admin@x.com");
    assert_eq!(body["role"], "ADMIN");
    assert_eq!(body["authorities"], serde_json::json!(["ROLE_ADMIN"]));
}

#[tokio::test]
async fn test_bad_tokens_fall_back_to_anonymous() {
    let app = TestApp::new();
    app.seed_user("alice@x.com", Role::User, true);
    let token = app.token_for("alice@x.com").await;

    let forged = JwtHandler::new("some-other-secret-that-is-also-32-bytes!", Duration::hours(1))
        .unwrap()
        .generate_token("alice@x.com", Role::Admin)
        .unwrap();

    for bad in [tamper_signature(&token), forged, "garbage".to_string()] {
        let (status, body) = app
            .send(json_request(Method::GET, "/api/auth/me", None, Some(&bad)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token {bad} was accepted");
        assert_eq!(body["message"], "Authentication required");
    }
}

#[tokio::test]
async fn test_public_routes_ignore_bad_tokens() {
    let app = TestApp::new();
    app.seed_user("alice@x.com", Role::User, true);

    let (status, body) = app
        .send(json_request(Method::GET, "/health", None, Some("not.a.jwt")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/auth/login",
            Some(serde_json::json!({ "email": "alice@x.com", "password": PASSWORD })),
            Some("not.a.jwt"),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_expired_token_is_anonymous() {
    let app = TestApp::with_ttl(Duration::seconds(2));
    app.seed_user("alice@x.com", Role::User, true);
    let token = app.token_for("alice@x.com").await;

    let (status, _) = app
        .send(json_request(Method::GET, "/api/auth/me", None, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;

    let (status, _) = app
        .send(json_request(Method::GET, "/api/auth/me", None, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_outlives_account_deletion() {
    let app = TestApp::new();
    let id = app.seed_user("alice@x.com", Role::User, true);
    let token = app.token_for("alice@x.com").await;

    assert!(app.state.user_store.delete_user(id).unwrap());

    // Verification never consults the store
    let (status, body) = app
        .send(json_request(Method::GET, "/api/auth/me", None, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@x.com");
}

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/auth/register",
            Some(serde_json::json!({
                "name": "Carol",
                "email": "carol@x.com",
                "password": "hunter22"
            })),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "USER");
    assert_eq!(body["active"], true);
    assert!(body.get("password_hash").is_none());

    let (status, body) = app.login("carol@x.com", "hunter22").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "USER");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new();
    app.seed_user("alice@x.com", Role::User, true);

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/auth/register",
            Some(serde_json::json!({
                "name": "Alice Again",
                "email": "alice@x.com",
                "password": "another-pass"
            })),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already registered: alice@x.com");
}
