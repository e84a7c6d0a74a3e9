//! Login Service
//! Mission: Turn submitted credentials into a signed token, or one typed failure

use crate::auth::{
    jwt::JwtHandler,
    models::{LoginRequest, LoginResponse},
    password::CredentialVerifier,
    user_store::UserStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
pub const ACCOUNT_INACTIVE_MESSAGE: &str = "Account is inactive";
pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful";

/// Terminal login failures
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account is inactive")]
    AccountInactive,
    #[error("login failed: {0}")]
    Internal(String),
}

/// Orchestrates credential checks and token issuance
pub struct AuthService {
    user_store: Arc<UserStore>,
    verifier: Arc<CredentialVerifier>,
    jwt_handler: Arc<JwtHandler>,
}

impl AuthService {
    pub fn new(
        user_store: Arc<UserStore>,
        verifier: Arc<CredentialVerifier>,
        jwt_handler: Arc<JwtHandler>,
    ) -> Self {
        Self {
            user_store,
            verifier,
            jwt_handler,
        }
    }

    /// Authenticate `request` and mint a token for the account.
    ///
    /// Checks run in order: account lookup, password, active flag. No token
    /// is produced unless all three pass.
    pub fn login(&self, request: &LoginRequest) -> Result<LoginResponse, LoginError> {
        info!("🔐 Login attempt: {}", request.email);

        let user = match self.user_store.find_by_email(&request.email) {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.verifier.verify_decoy(&request.password);
                warn!("❌ Unknown account: {}", request.email);
                return Err(LoginError::InvalidCredentials);
            }
            Err(e) => {
                error!("User lookup failed for {}: {}", request.email, e);
                return Err(LoginError::Internal(e.to_string()));
            }
        };

        if !self.verifier.verify(&user.password_hash, &request.password) {
            warn!("❌ Wrong password for: {}", request.email);
            return Err(LoginError::InvalidCredentials);
        }

        if !user.active {
            warn!("⛔ Inactive account: {}", request.email);
            return Err(LoginError::AccountInactive);
        }

        let token = self
            .jwt_handler
            .generate_token(&user.email, user.role)
            .map_err(|e| {
                error!("Token issuance failed for {}: {}", user.email, e);
                LoginError::Internal(e.to_string())
            })?;

        info!("✅ Login successful: {} ({})", user.email, user.role);

        Ok(LoginResponse {
            token,
            email: user.email,
            role: user.role,
            message: LOGIN_SUCCESS_MESSAGE.to_string(),
            expires_in: self.jwt_handler.ttl().num_seconds(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{models::Role, user_store::NewUser};
    use chrono::Duration;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    struct Fixture {
        service: AuthService,
        store: Arc<UserStore>,
        jwt: Arc<JwtHandler>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(UserStore::open_in_memory().unwrap());
        let verifier = Arc::new(CredentialVerifier::new(4).unwrap());
        let jwt = Arc::new(JwtHandler::new(TEST_SECRET, Duration::hours(24)).unwrap());

        for (email, role, active) in [
            ("a@x.com", Role::User, true),
            ("boss@x.com", Role::Admin, true),
            ("off@x.com", Role::User, false),
        ] {
            store
                .create_user(NewUser {
                    name: "Test".to_string(),
                    email: email.to_string(),
                    password_hash: verifier.hash("correct-horse").unwrap(),
                    role,
                    active,
                })
                .unwrap();
        }

        Fixture {
            service: AuthService::new(store.clone(), verifier, jwt.clone()),
            store,
            jwt,
        }
    }

    fn request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_login_success_returns_token() {
        let f = fixture();

        let response = f.service.login(&request("a@x.com", "correct-horse")).unwrap();
        assert_eq!(response.email, "a@x.com");
        assert_eq!(response.role, Role::User);
        assert_eq!(response.message, LOGIN_SUCCESS_MESSAGE);
        assert_eq!(response.expires_in, 24 * 3600);

        let claims = f.jwt.validate_token(&response.token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn test_admin_login_carries_admin_role() {
        let f = fixture();
        let response = f.service.login(&request("boss@x.com", "correct-horse")).unwrap();
        assert_eq!(response.role, Role::Admin);
        assert_eq!(f.jwt.validate_token(&response.token).unwrap().role, Role::Admin);
    }

    #[test]
    fn test_unknown_email_and_wrong_password_look_the_same() {
        let f = fixture();

        let unknown = f.service.login(&request("ghost@x.com", "correct-horse")).unwrap_err();
        let wrong = f.service.login(&request("a@x.com", "battery-staple")).unwrap_err();

        assert!(matches!(unknown, LoginError::InvalidCredentials));
        assert!(matches!(wrong, LoginError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.to_string(), INVALID_CREDENTIALS_MESSAGE);
    }

    #[test]
    fn test_inactive_account_is_distinct() {
        let f = fixture();

        let err = f.service.login(&request("off@x.com", "correct-horse")).unwrap_err();
        assert!(matches!(err, LoginError::AccountInactive));
        assert_ne!(err.to_string(), INVALID_CREDENTIALS_MESSAGE);
    }

    #[test]
    fn test_inactive_account_with_wrong_password_is_invalid_credentials() {
        let f = fixture();

        let err = f.service.login(&request("off@x.com", "nope")).unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));
    }

    #[test]
    fn test_login_has_no_side_effects_on_store() {
        let f = fixture();
        let before = f.store.list_users().unwrap().len();

        let _ = f.service.login(&request("a@x.com", "correct-horse"));
        let _ = f.service.login(&request("ghost@x.com", "x"));

        assert_eq!(f.store.list_users().unwrap().len(), before);
    }
}
