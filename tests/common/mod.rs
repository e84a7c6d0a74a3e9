//! Shared harness: an in-memory service driven through `tower::ServiceExt::oneshot`

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use user_service::{
    api::create_router,
    auth::{
        user_store::NewUser, AuthState, CredentialVerifier, JwtHandler, Role, UserStore,
    },
};

pub const TEST_SECRET: &str = "integration-test-secret-with-plenty-of-bytes";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub router: Router,
    pub state: AuthState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(24))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let user_store = Arc::new(UserStore::open_in_memory().unwrap());
        let verifier = Arc::new(CredentialVerifier::new(4).unwrap());
        let jwt_handler = Arc::new(JwtHandler::new(TEST_SECRET, ttl).unwrap());

        let state = AuthState::new(user_store, verifier, jwt_handler);
        let router = create_router(state.clone());
        Self { router, state }
    }

    /// Insert an account directly, bypassing the HTTP surface
    pub fn seed_user(&self, email: &str, role: Role, active: bool) -> i64 {
        let password_hash = self.state.verifier.hash(PASSWORD).unwrap();
        self.state
            .user_store
            .create_user(NewUser {
                name: email.split('@').next().unwrap_or("user").to_string(),
                email: email.to_string(),
                password_hash,
                role,
                active,
            })
            .unwrap()
            .id
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request(
            Method::POST,
            "/api/auth/login",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
        ))
        .await
    }

    /// Log in with the shared test password and return the bearer token
    pub async fn token_for(&self, email: &str) -> String {
        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get_with_header(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap()
}

/// Change the first character of the signature segment
pub fn tamper_signature(token: &str) -> String {
    let dot = token.rfind('.').unwrap();
    let (head, signature) = token.split_at(dot + 1);
    let first = signature.chars().next().unwrap();
    let replacement = if first == 'A' { 'B' } else { 'A' };
    format!("{head}{replacement}{}", &signature[1..])
}
