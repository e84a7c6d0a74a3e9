//! User Service - user-management REST backend with JWT authentication

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::{path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_service::{
    api::create_router,
    auth::{AuthState, CredentialVerifier, JwtHandler, UserStore},
    config::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::parse();

    info!("🚀 User service starting");
    info!("🗄️  Database: {}", config.db_path);

    if config.uses_dev_secret() {
        warn!("⚠️  JWT_SECRET not set, using the development secret");
    }

    // A bad signing key must stop startup, never fall back to anonymous-only
    let jwt_handler = Arc::new(
        JwtHandler::new(&config.jwt_secret, config.jwt_ttl())
            .context("Invalid JWT configuration")?,
    );
    info!(
        "🔐 JWT enabled (token lifetime {}s)",
        jwt_handler.ttl().num_seconds()
    );

    let verifier = Arc::new(
        CredentialVerifier::new(config.bcrypt_cost).context("Invalid bcrypt cost")?,
    );

    let user_store = Arc::new(
        UserStore::new(&config.db_path)
            .with_context(|| format!("Failed to open user store at {}", config.db_path))?,
    );

    seed_admin(&config, &user_store, &verifier)?;

    let state = AuthState::new(user_store, verifier, jwt_handler);
    let app = create_router(state);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("✅ Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Server stopped");
    Ok(())
}

/// Create the configured admin account when the store is empty
fn seed_admin(config: &Config, store: &UserStore, verifier: &CredentialVerifier) -> Result<()> {
    let Some((email, password)) = config.admin_seed() else {
        return Ok(());
    };

    if password.len() < 6 {
        warn!("⚠️  ADMIN_PASSWORD shorter than 6 characters, skipping admin seed");
        return Ok(());
    }

    let hash = verifier.hash(password)?;
    store.ensure_admin("Administrator", email, &hash)?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    let _ = dotenv();

    // Running from another directory with --manifest-path
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
