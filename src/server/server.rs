use std::sync::Arc;
use std::error::Error;
use tokio::net::TcpListener;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::registry::ModelRegistry;
use super::routes;

/// Builds the application router over a shared registry.
pub fn router(registry: Arc<ModelRegistry>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(routes::health_check))
        .route("/api/models", post(routes::create_model).get(routes::list_models))
        .route("/api/models/{id}", get(routes::get_model))
        .route("/api/models/{id}/files", post(routes::upload_files))
        .route("/api/models/{id}/files/{name}", get(routes::get_file))
        .route("/api/captures", post(routes::save_captures))
        // paths used by the first browser client
        .route("/api/modelos", post(routes::create_model).get(routes::list_models))
        .route("/api/capturas", post(routes::save_captures))
        .route("/api/guardar-modelo/{id}", post(routes::upload_files))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// API Server exposing the model registry over HTTP
pub struct ApiServer {
    registry: Arc<ModelRegistry>,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(registry: ModelRegistry, config: ServerConfig) -> Self {
        info!("Creating new API server on {}:{}", config.host, config.port);
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    /// Serves requests until Ctrl-C is received.
    pub async fn start(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let app = router(Arc::clone(&self.registry), &self.config);

        info!("Starting server on {}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;

        info!("Server started successfully");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        // never resolve so the server keeps running
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
