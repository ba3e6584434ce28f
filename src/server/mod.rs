// Server module - HTTP server setup and routing
pub mod handlers;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use self::state::AppState;
use crate::config::ServerConfig;

/// Create CORS layer from the configured origins. A `"*"` entry allows any origin.
pub fn create_cors_layer(server: &ServerConfig) -> CorsLayer {
    let allow_origin = if server.cors_origins.iter().any(|origin| origin.trim() == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::IF_NONE_MATCH])
}

/// Create the Axum application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = create_cors_layer(&state.config.server);

    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        .route("/:spec", get(handlers::viewer))
        .route("/graph/:spec", get(handlers::png_graph))
        .route("/svg/:spec", get(handlers::svg_graph))
        .route("/api/:spec", get(handlers::diagram_json))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server on the specified address until Ctrl-C
pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Server listening on {}", addr);
    info!("- Viewer: http://{}/<mod>,<mult>", addr);
    info!("- PNG endpoint: http://{}/graph/<mod>,<mult>", addr);
    info!("- Health endpoint: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardioidConfig;

    fn app_with_origins(origins: &[&str]) -> Router {
        let mut config = CardioidConfig::default();
        config.server.cors_origins = origins.iter().map(|o| o.to_string()).collect();
        create_app(AppState::new(config).unwrap())
    }

    #[test]
    fn wildcard_origin_builds_router() {
        app_with_origins(&["*"]);
        app_with_origins(&["http://localhost:3000", " * "]);
    }

    #[test]
    fn invalid_origins_are_skipped() {
        app_with_origins(&["http://localhost:3000", "bad\norigin"]);
    }
}
