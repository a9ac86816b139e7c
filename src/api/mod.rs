//! HTTP API module - feed and listing endpoints

mod feed;
mod listings;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::feed::FeedAssembler;
use crate::storage::StorageClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub assembler: FeedAssembler,
    pub storage: Option<StorageClient>,
}

/// Build the API router
pub fn router(config: Config, assembler: FeedAssembler, storage: Option<StorageClient>) -> Router {
    let state = AppState {
        config: Arc::new(config),
        assembler,
        storage,
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .merge(feed::router())
        .merge(listings::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "photofeed",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Error body used by the feed and gallery routes
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error body used by the story and upload listings
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
