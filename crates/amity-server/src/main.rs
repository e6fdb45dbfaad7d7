use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use amity_api::auth::{self, AppState, AppStateInner};
use amity_api::friends;
use amity_api::middleware::require_auth;
use amity_api::users;
use amity_core::{Lifecycle, RateLimitConfig, RateLimiter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amity=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("AMITY_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("AMITY_DB_PATH").unwrap_or_else(|_| "amity.db".into());
    let host = std::env::var("AMITY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("AMITY_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let rate_config = RateLimitConfig {
        window_secs: std::env::var("AMITY_RATE_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60),
        max_per_window: std::env::var("AMITY_RATE_MAX_SENDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3),
    };

    // Init database
    let db = Arc::new(amity_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let lifecycle = Lifecycle::new(db.clone(), RateLimiter::new(rate_config));
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        lifecycle,
        jwt_secret,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users/search", get(users::search))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/friend-requests/send", post(friends::send_request))
        .route("/friend-requests/{request_id}/accept", post(friends::accept_request))
        .route("/friend-requests/{request_id}/reject", post(friends::reject_request))
        .route("/friend-requests/pending", get(friends::pending_requests))
        .route("/friends", get(friends::list_friends))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Amity server listening on {}", addr);
    info!(
        "Rate limit: {} sends per {}s window",
        rate_config.max_per_window, rate_config.window_secs
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
