use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    api::users,
    auth::{api as auth_api, authenticate_request, AuthState, RequestAuthenticator},
    middleware::request_logging,
};

/// Create the API router.
///
/// Every request passes through the authenticator, which only annotates it;
/// handlers decide whether an anonymous caller is acceptable.
pub fn create_router(state: AuthState) -> Router {
    let authenticator = RequestAuthenticator::new(state.jwt_handler.clone());

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/register", post(auth_api::register));

    let user_routes = Router::new()
        .route("/api/auth/me", get(auth_api::get_current_user))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        );

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            authenticator,
            authenticate_request,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging))
                .layer(CorsLayer::permissive()),
        )
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
