//! User Service Library
//!
//! User-management REST backend with stateless JWT authentication.
//! Exposes the modules used by the server binary and the integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;

pub use api::create_router;
pub use config::Config;
pub use error::ApiError;
