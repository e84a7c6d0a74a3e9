//! Service configuration
//!
//! Every option can come from a flag or from the environment (`.env` is
//! loaded first by the binary).

use chrono::Duration;
use clap::Parser;

/// Development-only signing secret; startup warns when it is in use
pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

#[derive(Parser, Debug, Clone)]
#[command(name = "user-service")]
#[command(about = "User management REST backend with JWT authentication")]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// HTTP port
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// SQLite database holding user accounts
    #[arg(long, env = "AUTH_DB_PATH", default_value = "user_service.db")]
    pub db_path: String,

    /// HMAC signing secret, at least 32 bytes
    #[arg(long, env = "JWT_SECRET", default_value = DEV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in milliseconds
    #[arg(long, env = "JWT_EXPIRATION_MS", default_value = "86400000")]
    pub jwt_expiration_ms: i64,

    /// bcrypt work factor for stored passwords
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Seed an admin account with this email when the store has none
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Password for the seeded admin account
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

impl Config {
    pub fn jwt_ttl(&self) -> Duration {
        Duration::milliseconds(self.jwt_expiration_ms)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Admin seed credentials, only when both halves are configured
    pub fn admin_seed(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) if !email.trim().is_empty() => {
                Some((email.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}
