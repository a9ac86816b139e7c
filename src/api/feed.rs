//! Carousel feed endpoint
//!
//! GET /api/randomimages - randomized image URLs for the hero carousels

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::error;

use super::{AppState, ErrorResponse};
use crate::feed::{FeedError, FeedOptions};

/// Build the feed router
pub fn router() -> Router<AppState> {
    Router::new().route("/api/randomimages", get(random_images))
}

/// Per-request overrides of the configured feed options
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub pair_size: Option<usize>,
    pub prioritize: Option<bool>,
    pub head_size: Option<usize>,
}

impl FeedQuery {
    fn apply(&self, base: &FeedOptions) -> FeedOptions {
        let mut options = base.clone();
        if let Some(pair_size) = self.pair_size {
            options.pair_size = pair_size;
        }
        if let Some(prioritize) = self.prioritize {
            options.prioritize_smallest = prioritize;
        }
        if let Some(head_size) = self.head_size {
            options.head_size = head_size;
        }
        options
    }
}

/// Assemble and return the feed as a JSON array of URLs
async fn random_images(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> impl IntoResponse {
    let options = query.apply(&state.config.feed);

    match state.assembler.assemble(&options).await {
        Ok(urls) => (StatusCode::OK, Json(urls)).into_response(),
        Err(e @ FeedError::EmptyResult { .. }) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(FeedError::SourceUnavailable(e)) => {
            error!("Error fetching images: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "An error occurred while fetching images.".to_string(),
                }),
            )
                .into_response()
        }
    }
}
