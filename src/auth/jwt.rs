//! JWT Token Handler
//! Mission: Issue and verify signed HS256 tokens carrying subject, role and expiry

use crate::auth::models::{Claims, Role};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

/// Minimum secret length for HS256 (256 bits)
pub const MIN_SECRET_BYTES: usize = 32;

/// `exp` has one-second resolution, so shorter lifetimes expire on issue
pub const MIN_TTL_SECONDS: i64 = 1;

/// Upper bound on token lifetime (10 years)
pub const MAX_TTL_DAYS: i64 = 3650;

/// Startup-time failures building the token handler
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("signing key misconfigured: {0}")]
    SigningKeyMisconfigured(String),
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
}

/// Reasons a presented token is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed token")]
    MalformedToken,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for DecodeError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                DecodeError::SignatureInvalid
            }
            ErrorKind::ExpiredSignature => DecodeError::Expired,
            _ => DecodeError::MalformedToken,
        }
    }
}

/// HMAC key material, built once from the configured secret
struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    fn from_secret(secret: &str) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(JwtError::SigningKeyMisconfigured(format!(
                "secret must be at least {MIN_SECRET_BYTES} bytes, got {}",
                secret.len()
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }
}

/// JWT Handler for token operations
///
/// Immutable after construction; share it behind an `Arc`.
pub struct JwtHandler {
    key: SigningKey,
    ttl: Duration,
    validation: Validation,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key and token lifetime
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, JwtError> {
        if ttl < Duration::seconds(MIN_TTL_SECONDS) {
            return Err(JwtError::SigningKeyMisconfigured(format!(
                "token lifetime must be at least {MIN_TTL_SECONDS}s, got {}ms",
                ttl.num_milliseconds()
            )));
        }
        if ttl > Duration::days(MAX_TTL_DAYS) || Utc::now().checked_add_signed(ttl).is_none() {
            return Err(JwtError::SigningKeyMisconfigured(format!(
                "token lifetime must not exceed {MAX_TTL_DAYS} days"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `is_expired` against an explicit clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            key: SigningKey::from_secret(secret)?,
            ttl,
            validation,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a token for a subject, issued now
    pub fn generate_token(&self, subject: &str, role: Role) -> Result<String, JwtError> {
        self.generate_token_at(subject, role, Utc::now())
    }

    /// Generate a token with `iat = now` and `exp = now + ttl`
    pub fn generate_token_at(
        &self,
        subject: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(JwtError::ExpiryOutOfRange)?;

        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        debug!(
            subject,
            role = role.as_str(),
            exp = claims.exp,
            "Generating JWT"
        );

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key.encoding)?;
        Ok(token)
    }

    /// Validate a token against the current time and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, DecodeError> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validate signature and structure, then reject if expired at `now`
    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, DecodeError> {
        let decoded = decode::<Claims>(token, &self.key.decoding, &self.validation)?;

        if Self::is_expired(&decoded.claims, now) {
            return Err(DecodeError::Expired);
        }

        Ok(decoded.claims)
    }

    /// A token is expired from its `exp` instant onwards
    pub fn is_expired(claims: &Claims, now: DateTime<Utc>) -> bool {
        now.timestamp() >= claims.exp
    }
}
