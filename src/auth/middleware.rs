//! Authentication Middleware
//! Mission: Attach the bearer token's identity to each request, never reject here

use crate::auth::{
    jwt::{DecodeError, JwtHandler},
    models::{Identity, Role, SecurityContext},
};
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

pub const BEARER_PREFIX: &str = "Bearer ";

/// What happened to a single request's authentication pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No header, or not a bearer credential
    NoToken,
    /// Context already held an identity and was left untouched
    AlreadyAuthenticated,
    Authenticated,
    /// Token present but unusable; request continues anonymously
    Rejected(DecodeError),
}

/// Reads the bearer token and populates the request's security context
#[derive(Clone)]
pub struct RequestAuthenticator {
    jwt_handler: Arc<JwtHandler>,
}

impl RequestAuthenticator {
    pub fn new(jwt_handler: Arc<JwtHandler>) -> Self {
        Self { jwt_handler }
    }

    pub fn authenticate(&self, headers: &HeaderMap, ctx: &mut SecurityContext) -> AuthOutcome {
        self.authenticate_at(headers, ctx, Utc::now())
    }

    /// Single authentication pass. Never fails: bad tokens leave `ctx` empty.
    pub fn authenticate_at(
        &self,
        headers: &HeaderMap,
        ctx: &mut SecurityContext,
        now: DateTime<Utc>,
    ) -> AuthOutcome {
        if ctx.is_authenticated() {
            return AuthOutcome::AlreadyAuthenticated;
        }

        let Some(token) = bearer_token(headers) else {
            return AuthOutcome::NoToken;
        };

        match self.jwt_handler.validate_token_at(token, now) {
            Ok(claims) => {
                let identity = Identity::from_claims(&claims);
                debug!(
                    subject = identity.subject(),
                    authority = %identity.authority(),
                    "Request authenticated"
                );
                ctx.authenticate(identity);
                AuthOutcome::Authenticated
            }
            Err(err) => {
                log_anonymous_fallback(err);
                AuthOutcome::Rejected(err)
            }
        }
    }
}

/// Every decode failure downgrades the request to anonymous; only the log level differs.
fn log_anonymous_fallback(err: DecodeError) {
    match err {
        DecodeError::SignatureInvalid => {
            info!("Bearer token signature rejected, continuing unauthenticated")
        }
        DecodeError::Expired => debug!("Bearer token expired, continuing unauthenticated"),
        DecodeError::MalformedToken => debug!("Bearer token malformed, continuing unauthenticated"),
    }
}

/// Raw token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
}

/// Middleware that annotates the request with a `SecurityContext`.
///
/// Public routes see an anonymous context; protected handlers reject via
/// the `Authenticated` extractor.
pub async fn authenticate_request(
    State(authenticator): State<RequestAuthenticator>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut ctx = req
        .extensions_mut()
        .remove::<SecurityContext>()
        .unwrap_or_default();

    authenticator.authenticate(req.headers(), &mut ctx);
    req.extensions_mut().insert(ctx);

    next.run(req).await
}

/// Identity of an authenticated caller; rejects anonymous requests with 401
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .and_then(SecurityContext::identity)
            .cloned()
            .map(Authenticated)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Require the identity to hold the authority for `role`
pub fn require_role(identity: &Identity, role: Role) -> Result<(), ApiError> {
    if identity.has_authority(&role.authority()) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
