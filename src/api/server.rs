//! HTTP server implementation
//!
//! Axum router serving the entry page, upload/download and the JSON API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::session::SessionStore;
use crate::types::DEFAULT_PREVIEW_ROWS;

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Idle time after which a session is ended
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper and lower bounds on how often idle sessions are swept
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);
const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(10);

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Trailing rows shown in the preview
    pub preview_rows: usize,
    /// Sessions untouched for this long are ended
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub sessions: SessionStore,
    pub preview_rows: usize,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            sessions: SessionStore::new(),
            preview_rows: config.preview_rows,
        }
    }
}

/// Build the router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Entry page
        .route("/", get(handlers::index))
        .route("/rows", post(handlers::add_row))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/download", get(handlers::download))
        // Health and info endpoints
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // JSON API
        .route("/api/v1/rows", post(handlers::api_add_row))
        .route("/api/v1/preview", get(handlers::api_preview))
        .route("/api/v1/session", delete(handlers::end_session))
        // State and middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Periodically end sessions idle for longer than `ttl`
pub fn spawn_session_sweeper(sessions: SessionStore, ttl: Duration) -> JoinHandle<()> {
    let period = ttl.clamp(MIN_SWEEP_PERIOD, MAX_SWEEP_PERIOD);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            sessions.evict_idle(ttl);
        }
    })
}

/// Run the server until Ctrl+C / SIGTERM
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contract_intake=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::new(&config));
    let sweeper = spawn_session_sweeper(state.sessions.clone(), config.session_ttl);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("📋 Contract intake form starting on http://{}", addr);
    info!("   Preview shows the last {} rows", config.preview_rows);
    info!("   Sessions end after {}s idle", config.session_ttl.as_secs());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ServerConfig Tests ====================

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.session_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn test_config_address_format() {
        let config = ServerConfig {
            host: "192.168.1.100".to_string(),
            port: 9090,
            ..Default::default()
        };
        let addr_str = format!("{}:{}", config.host, config.port);
        let addr: SocketAddr = addr_str.parse().unwrap();
        assert_eq!(addr.port(), 9090);
    }

    // ==================== AppState Tests ====================

    #[test]
    fn test_app_state_from_config() {
        let config = ServerConfig {
            preview_rows: 25,
            ..Default::default()
        };
        let state = AppState::new(&config);
        assert_eq!(state.preview_rows, 25);
        assert_eq!(state.version, env!("CARGO_PKG_VERSION"));
        assert!(state.sessions.is_empty());
    }

    #[test]
    fn test_app_state_clone_shares_sessions() {
        let state = AppState::new(&ServerConfig::default());
        let cloned = state.clone();
        state.sessions.create(None).unwrap();
        assert_eq!(cloned.sessions.len(), 1);
    }

    // ==================== Session Sweeper Tests ====================

    #[tokio::test]
    async fn test_sweeper_ends_idle_sessions() {
        let sessions = SessionStore::new();
        sessions.create(None).unwrap();

        let sweeper = spawn_session_sweeper(sessions.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(500)).await;
        sweeper.abort();

        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_keeps_sessions_within_ttl() {
        let sessions = SessionStore::new();
        let id = sessions.create(None).unwrap();

        let sweeper = spawn_session_sweeper(sessions.clone(), Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();

        assert!(sessions.contains(id));
    }
}
