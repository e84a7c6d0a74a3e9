//! Authentication API Endpoints
//! Mission: Provide login, registration and current-identity endpoints

use crate::{
    api::users::create_account,
    auth::{
        jwt::JwtHandler,
        middleware::Authenticated,
        models::{CreateUserRequest, IdentityResponse, LoginRequest, LoginResponse, Role, UserResponse},
        password::CredentialVerifier,
        service::AuthService,
        user_store::UserStore,
    },
    error::ApiError,
};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub verifier: Arc<CredentialVerifier>,
    pub jwt_handler: Arc<JwtHandler>,
    pub auth_service: Arc<AuthService>,
}

impl AuthState {
    pub fn new(
        user_store: Arc<UserStore>,
        verifier: Arc<CredentialVerifier>,
        jwt_handler: Arc<JwtHandler>,
    ) -> Self {
        let auth_service = Arc::new(AuthService::new(
            user_store.clone(),
            verifier.clone(),
            jwt_handler.clone(),
        ));

        Self {
            user_store,
            verifier,
            jwt_handler,
            auth_service,
        }
    }
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.validate()?;

    // bcrypt is CPU-bound; keep it off the async workers
    let service = state.auth_service.clone();
    let response = tokio::task::spawn_blocking(move || service.login(&payload))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(response))
}

/// Public registration - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = create_account(&state, payload, Role::User).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get current identity - GET /api/auth/me
/// Built from the verified token, no database lookup needed
pub async fn get_current_user(
    Authenticated(identity): Authenticated,
) -> Json<IdentityResponse> {
    Json(IdentityResponse::from_identity(&identity))
}
