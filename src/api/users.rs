//! User management endpoints
//!
//! Reads need any authenticated caller; create/delete need `ADMIN`;
//! updates need `ADMIN` or the account owner.

use crate::{
    auth::{
        middleware::{require_role, Authenticated},
        models::{CreateUserRequest, Role, UpdateUserRequest, UserResponse},
        user_store::{NewUser, UserUpdate},
        AuthState,
    },
    error::ApiError,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

/// List all users - GET /api/users
pub async fn list_users(
    State(state): State<AuthState>,
    Authenticated(_identity): Authenticated,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.user_store.list_users()?;
    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

/// Fetch one user - GET /api/users/{id}
pub async fn get_user(
    State(state): State<AuthState>,
    Authenticated(_identity): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_store
        .find_by_id(id)?
        .ok_or(ApiError::UserNotFound(id))?;
    Ok(Json(UserResponse::from_user(&user)))
}

/// Create user - POST /api/users (Admin only)
pub async fn create_user(
    State(state): State<AuthState>,
    Authenticated(identity): Authenticated,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    require_role(&identity, Role::Admin)?;

    let user = create_account(&state, payload, Role::User).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update user - PUT /api/users/{id} (Admin or the user themselves)
pub async fn update_user(
    State(state): State<AuthState>,
    Authenticated(identity): Authenticated,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate()?;

    let existing = state
        .user_store
        .find_by_id(id)?
        .ok_or(ApiError::UserNotFound(id))?;

    if existing.email != identity.subject() {
        require_role(&identity, Role::Admin)?;
    }

    let password_hash = match payload.password {
        Some(password) => Some(hash_password(&state, password).await?),
        None => None,
    };

    let user = state.user_store.update_user(
        id,
        UserUpdate {
            name: payload.name,
            email: payload.email,
            password_hash,
        },
    )?;

    info!("✏️  User updated: {} by {}", user.id, identity.subject());
    Ok(Json(UserResponse::from_user(&user)))
}

/// Delete user - DELETE /api/users/{id} (Admin only)
pub async fn delete_user(
    State(state): State<AuthState>,
    Authenticated(identity): Authenticated,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_role(&identity, Role::Admin)?;

    if !state.user_store.delete_user(id)? {
        return Err(ApiError::UserNotFound(id));
    }

    info!("🗑️  User deleted: {} by {}", id, identity.subject());
    Ok(StatusCode::NO_CONTENT)
}

/// Validate, hash and insert a new active account
pub(crate) async fn create_account(
    state: &AuthState,
    payload: CreateUserRequest,
    role: Role,
) -> Result<UserResponse, ApiError> {
    payload.validate()?;

    if state.user_store.email_exists(&payload.email)? {
        return Err(ApiError::EmailAlreadyExists(payload.email));
    }

    let password_hash = hash_password(state, payload.password).await?;

    let user = state.user_store.create_user(NewUser {
        name: payload.name,
        email: payload.email,
        password_hash,
        role,
        active: true,
    })?;

    Ok(UserResponse::from_user(&user))
}

async fn hash_password(state: &AuthState, password: String) -> Result<String, ApiError> {
    let verifier = state.verifier.clone();
    let hashed = tokio::task::spawn_blocking(move || verifier.hash(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(hashed)
}
