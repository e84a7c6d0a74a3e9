//! Authentication Module
//! Mission: Stateless JWT authentication for the user service

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod user_store;

pub use api::AuthState;
pub use jwt::{DecodeError, JwtError, JwtHandler};
pub use middleware::{authenticate_request, require_role, Authenticated, RequestAuthenticator};
pub use models::{Claims, Identity, Role, SecurityContext};
pub use password::CredentialVerifier;
pub use service::{AuthService, LoginError};
pub use user_store::UserStore;
