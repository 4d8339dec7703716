//! Coursify - course platform API server
//!
//! Startup: load `.env`, parse configuration (aborting if the database path
//! or signing secret is missing), open the database, bootstrap the first
//! administrator, then serve until Ctrl-C / SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursify_backend::{
    auth::{JwtHandler, PasswordHasher},
    create_router,
    middleware::RateLimiter,
    store::Database,
    AppState, Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::parse();
    info!(bind_addr = %config.bind_addr, "Starting Coursify API server");

    let db = Database::open(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;

    let jwt = Arc::new(JwtHandler::with_ttl(&config.jwt_secret, config.token_ttl()));
    let hasher = PasswordHasher::new(config.bcrypt_cost);
    let limits = config.rate_limit();
    info!(
        capacity = limits.capacity,
        refill_secs = limits.refill_interval.as_secs(),
        idle_secs = limits.idle_ttl.as_secs(),
        "Registration rate limiter configured"
    );
    let limiter = RateLimiter::new(limits);

    let state = AppState::new(db, hasher, jwt, limiter.clone());

    match config.admin_bootstrap() {
        Some((email, password)) => {
            state
                .users
                .bootstrap_admin(email, password, &config.admin_name)
                .await
                .context("Failed to bootstrap administrator account")?;
        }
        None => warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; no administrator will be bootstrapped"),
    }

    let sweeper = limiter.spawn_sweeper();

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

/// Initialize tracing with env-driven filtering
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursify_backend=debug,coursify=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate directory, for runs started from elsewhere
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
