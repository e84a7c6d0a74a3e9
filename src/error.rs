//! API errors
//!
//! Every failure leaves the HTTP layer as
//! `{timestamp, status, error, message}` (+ `errors` for validation).

use crate::auth::{service::LoginError, user_store::UserStoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account is inactive")]
    AccountInactive,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("User not found with id: {0}")]
    UserNotFound(i64),
    #[error("Email already registered: {0}")]
    EmailAlreadyExists(String),
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::AccountInactive | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::UserNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::EmailAlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => ApiError::InvalidCredentials,
            LoginError::AccountInactive => ApiError::AccountInactive,
            LoginError::Internal(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<UserStoreError> for ApiError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::EmailTaken(email) => ApiError::EmailAlreadyExists(email),
            UserStoreError::NotFound(id) => ApiError::UserNotFound(id),
            UserStoreError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), message)
            })
            .collect();
        ApiError::Validation(fields)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{err:#}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details go to the log, never to the client
        if let ApiError::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }

        let mut body = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
        });

        if let ApiError::Validation(fields) = self {
            body["errors"] = json!(fields);
        }

        (status, Json(body)).into_response()
    }
}
