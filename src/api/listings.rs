//! Image listing endpoints
//!
//! GET /api/images - flat gallery listing (file names)
//! GET /api/stories/{folder} - images of one story folder
//! GET /api/uploads - uploaded files
//! GET /api/bucket-images - thumbnail picker listing of a bucket folder

use std::io;
use std::sync::LazyLock;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{AppState, ErrorResponse, MessageResponse};
use crate::feed::local::{self, FEED_EXTENSIONS, GALLERY_EXTENSIONS};

/// Story folder names: one path segment, no dots
static FOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap());

/// Build the listings router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/images", get(gallery_images))
        .route("/api/stories/{folder}", get(story_images))
        .route("/api/uploads", get(uploads))
        .route("/api/bucket-images", get(bucket_images))
}

/// Validate a story folder name
pub fn is_valid_folder(folder: &str) -> bool {
    FOLDER_REGEX.is_match(folder)
}

async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}

/// Flat listing of the gallery directory
async fn gallery_images(State(state): State<AppState>) -> impl IntoResponse {
    let dir = state.config.public_root.join(&state.config.feed.media_dir);

    match blocking(move || local::list_flat(&dir, GALLERY_EXTENSIONS)).await {
        Ok(names) => (StatusCode::OK, Json(names)).into_response(),
        Err(e) => {
            error!("Failed to load gallery images: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to load images".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoryImages {
    pub images: Vec<String>,
}

/// Images of a single story folder, as public URLs
async fn story_images(
    Path(folder): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    if !is_valid_folder(&folder) {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "Invalid folder name".to_string(),
            }),
        )
            .into_response();
    }

    let stories_dir = state.config.stories_dir.clone();
    let dir = state.config.public_root.join(&stories_dir).join(&folder);
    debug!("Fetching story images from {}", dir.display());

    match blocking(move || local::list_flat(&dir, FEED_EXTENSIONS)).await {
        Ok(names) => {
            let images = names
                .into_iter()
                .map(|name| format!("/{}/{}/{}", stories_dir, folder, name))
                .collect();
            (StatusCode::OK, Json(StoryImages { images })).into_response()
        }
        Err(e) => {
            error!("Error reading story folder {}: {}", folder, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse {
                    message: "Failed to read folder".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// A listed file and its public URL
#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct FileList {
    pub files: Vec<FileEntry>,
}

/// Every file in the uploads directory; the directory is created if missing
async fn uploads(State(state): State<AppState>) -> impl IntoResponse {
    let uploads_dir = state.config.uploads_dir.clone();
    let dir = state.config.public_root.join(&uploads_dir);

    let listed = blocking(move || {
        std::fs::create_dir_all(&dir)?;
        local::list_files(&dir)
    })
    .await;

    match listed {
        Ok(names) => {
            let files = names
                .into_iter()
                .map(|name| FileEntry {
                    url: format!("/{}/{}", uploads_dir, name),
                    name,
                })
                .collect();
            (StatusCode::OK, Json(FileList { files })).into_response()
        }
        Err(e) => {
            error!("Error fetching uploads: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse {
                    message: "Failed to retrieve files".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BucketQuery {
    #[serde(default)]
    pub folder: String,
}

/// Entries of the thumbnail bucket with their public URLs
async fn bucket_images(
    State(state): State<AppState>,
    Query(query): Query<BucketQuery>,
) -> impl IntoResponse {
    let Some(storage) = &state.storage else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Object storage is not configured.".to_string(),
            }),
        )
            .into_response();
    };

    let bucket = &state.config.thumbnails_bucket;
    match storage.list(bucket, &query.folder).await {
        Ok(objects) => {
            let entries: Vec<FileEntry> = objects
                .into_iter()
                .map(|o| FileEntry {
                    url: storage
                        .public_url(bucket, &query.folder, &o.name)
                        .unwrap_or_default(),
                    name: o.name,
                })
                .collect();
            (StatusCode::OK, Json(entries)).into_response()
        }
        Err(e) => {
            error!("Error listing bucket images: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Error fetching bucket images.".to_string(),
                }),
            )
                .into_response()
        }
    }
}
