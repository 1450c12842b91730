//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, a body size
//! limit, and all endpoint handlers under `/api`.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use folio_core::config::ServerConfig;
use folio_core::FolioError;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);
    let body_limit = state.config.server.max_body_bytes;

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat))
        .route(
            "/conversation/{id}",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .route("/conversations", get(handlers::list_conversations))
        .route("/end-conversation", post(handlers::end_conversation))
        .route("/health", get(handlers::health))
        .route("/test-api", get(handlers::test_api))
        .route("/models", get(handlers::models).post(handlers::models))
        .route("/switch-model", post(handlers::switch_model));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins. `*` anywhere in the list allows any origin.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let allow_origin = if server.allowed_origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = server
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Bind the configured address and serve until the process exits.
pub async fn start_server(state: AppState) -> Result<(), FolioError> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FolioError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| FolioError::Server(format!("Server error: {}", e)))?;

    Ok(())
}
