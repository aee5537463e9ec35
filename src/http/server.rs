//! HTTP server for the PathCORE-T pages and JSON API

use super::compression::gzip_response;
use super::handler::{
    asset_handler, docs_handler, edge_genes_handler, edge_handler, home_handler,
    network_edges_handler, network_file_handler, pao1_file_handler, pao1_handler,
    quickview_handler, status_handler, tcga_handler,
};
use crate::config::ServerConfig;
use crate::session::SessionStore;
use crate::store::PathcoreStore;
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PathcoreStore>,
    pub sessions: SessionStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn PathcoreStore>, config: ServerConfig) -> Self {
        Self {
            store,
            sessions: SessionStore::new(config.session_capacity),
            config: Arc::new(config),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let edge_routes = Router::new()
        .route("/edge/*rest", get(edge_handler))
        .layer(middleware::from_fn(gzip_response));

    let api_routes = Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/network", get(network_edges_handler))
        .route("/api/edge-genes", get(edge_genes_handler))
        .route("/api/networks/:file", get(network_file_handler))
        .layer(CorsLayer::permissive());

    let static_files = ServeDir::new(&state.config.static_path);

    Router::new()
        .route("/", get(home_handler))
        .route("/pathcore-docs", get(docs_handler))
        .route("/PAO1", get(pao1_handler))
        .route("/PAO1/file", get(pao1_file_handler))
        .route("/TCGA", get(tcga_handler))
        .route("/quickview", get(quickview_handler))
        .route("/assets/*path", get(asset_handler))
        .merge(edge_routes)
        .merge(api_routes)
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server managing the demo pages, API and static assets
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Start the HTTP server
    pub async fn start(&self) -> std::io::Result<()> {
        let addr = self.state.config.bind_address();
        let app = build_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("PathCORE-T demo available at http://{}", addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
