//! # Server Module
//!
//! HTTP server setup and route configuration for the news server.

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::get,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::jwt::TokenService;
use crate::auth::middleware::AuthMiddleware;
use crate::config::{Config, StoreBackend};
use crate::database::{CredentialStore, DatabaseConnection, MemoryStore};
use crate::routes::{auth, health, news};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

/// Open the configured credential store
pub async fn connect_store(config: &Config) -> Result<Arc<dyn CredentialStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
            Ok(store)
        }
        StoreBackend::Postgres => {
            let settings = config
                .database
                .as_ref()
                .context("postgres backend selected without database settings")?;
            let db = DatabaseConnection::from_url(&settings.url, settings.max_connections)
                .await
                .context("Unable to connect to database")?;
            let store: Arc<dyn CredentialStore> = Arc::new(db);
            Ok(store)
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}

/// Assemble the full router. News routes sit behind the auth gate unless
/// `require_auth` is off.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_allowed_origins);
    let mut news_routes = news::create_news_routes();
    if state.config.require_auth {
        news_routes = news_routes.route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            AuthMiddleware::validate_token,
        ));
    }

    Router::new()
        .route("/ping", get(health::ping))
        .route("/health", get(health::health))
        .merge(auth::create_auth_routes())
        .merge(news_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Starts the news HTTP server and runs until a shutdown signal arrives.
pub async fn start(config: Config) -> Result<()> {
    let tokens = Arc::new(TokenService::new(&config.jwt_secret)?);
    let store = connect_store(&config).await?;

    if !config.require_auth {
        tracing::warn!("REQUIRE_AUTH=false: news endpoints are open and take the author from the request body");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let backend = config.store_backend.as_str();
    let app = build_router(AppState {
        store,
        tokens,
        config: Arc::new(config),
    });

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} - port may already be in use", addr))?;

    tracing::info!("🚀 News server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("🗄️  Store backend: {}", backend);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
