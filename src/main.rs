//! Innkeep - Hotel Management Backend
//! Mission: Rooms, guests, bookings and services behind JWT + RBAC

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use innkeep_backend::{
    api,
    auth::{AuthState, JwtHandler, UserStore},
    config::Config,
    middleware::RateLimitConfig,
    store::Db,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("🏨 Innkeep backend starting");

    let config = Config::from_env()?;

    let user_store = Arc::new(UserStore::new(&config.database_path, config.bcrypt_cost)?);
    let jwt_handler = Arc::new(JwtHandler::new(
        config.jwt_secret.clone(),
        config.token_ttl_minutes,
    ));
    let auth_state = AuthState::new(user_store, jwt_handler.clone());

    let db = Db::new(&config.database_path)?;

    info!("📊 Database initialized at: {}", config.database_path);
    info!(
        "🔐 Authentication initialized (token lifetime {}m, bcrypt cost {})",
        config.token_ttl_minutes, config.bcrypt_cost
    );

    let rate_limit = RateLimitConfig {
        max_attempts: config.login_rate_limit,
        window: Duration::from_secs(config.login_rate_window_secs),
    };

    let app = api::create_router(db, auth_state, jwt_handler, rate_limit);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "innkeep_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate directory (common when running with --manifest-path
    // from elsewhere).
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
