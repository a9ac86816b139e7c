//! Carousel image feed
//!
//! Builds the randomized list of image URLs shown by the hero carousels:
//! - Local images found by a recursive walk of the media directory
//! - Remote images from one flat listing of an object-storage folder
//! - Optional smallest-first head, then a shuffle of consecutive pairs
//!
//! Nothing is cached; every call re-walks the directory and re-lists the
//! bucket.

mod arrange;
pub mod local;

use std::path::PathBuf;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::StorageClient;
pub use arrange::{arrange, group};

/// One discoverable image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub url: String,
    /// Exact for local files, probed for remote ones; `None` sorts last
    pub size_bytes: Option<u64>,
}

impl ImageRecord {
    fn sort_key(&self) -> (bool, u64) {
        (self.size_bytes.is_none(), self.size_bytes.unwrap_or(0))
    }
}

/// Remote folder to include in the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketLocation {
    pub name: String,
    #[serde(default)]
    pub folder: String,
}

/// Feed assembly options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedOptions {
    /// Directory under the public root, walked recursively
    pub media_dir: String,
    pub bucket: Option<BucketLocation>,
    /// Consecutive images kept together through the shuffle
    pub pair_size: usize,
    pub prioritize_smallest: bool,
    /// Number of smallest images shown first when prioritizing
    pub head_size: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            media_dir: "pictures-gallery".to_string(),
            bucket: None,
            pair_size: 2,
            prioritize_smallest: false,
            head_size: 3,
        }
    }
}

impl FeedOptions {
    fn effective_head(&self) -> usize {
        if self.prioritize_smallest {
            self.head_size
        } else {
            0
        }
    }
}

/// Feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("image source unavailable: {0}")]
    SourceUnavailable(#[from] std::io::Error),

    #[error("No images found in the '{folder}' directory.")]
    EmptyResult { folder: String },
}

/// Assembles the carousel feed from the local media tree and an optional
/// object-storage bucket
#[derive(Clone)]
pub struct FeedAssembler {
    public_root: PathBuf,
    storage: Option<StorageClient>,
}

impl FeedAssembler {
    /// Create an assembler rooted at the site's public directory
    pub fn new(public_root: impl Into<PathBuf>, storage: Option<StorageClient>) -> Self {
        Self {
            public_root: public_root.into(),
            storage,
        }
    }

    /// Build the feed: local images, then remote images, ordered for display
    pub async fn assemble(&self, options: &FeedOptions) -> Result<Vec<String>, FeedError> {
        let mut records = self.discover_local(&options.media_dir).await?;
        let local_count = records.len();

        if let Some(bucket) = &options.bucket {
            records.extend(self.discover_remote(bucket, options.prioritize_smallest).await);
        }

        if records.is_empty() {
            return Err(FeedError::EmptyResult {
                folder: options.media_dir.clone(),
            });
        }

        info!(
            "Assembling feed from {} local and {} remote images",
            local_count,
            records.len() - local_count
        );

        let head = options.effective_head();
        Ok(arrange(records, options.pair_size, head, &mut rand::rng()))
    }

    async fn discover_local(&self, media_dir: &str) -> Result<Vec<ImageRecord>, FeedError> {
        let root = self.public_root.clone();
        let dir = media_dir.to_string();

        let records = tokio::task::spawn_blocking(move || local::discover(&root, &dir))
            .await
            .map_err(std::io::Error::other)??;

        Ok(records)
    }

    /// List the bucket folder; any listing failure yields no remote images
    async fn discover_remote(&self, bucket: &BucketLocation, probe_sizes: bool) -> Vec<ImageRecord> {
        let Some(storage) = &self.storage else {
            warn!(
                "Bucket '{}' configured for the feed but no storage client is set up",
                bucket.name
            );
            return Vec::new();
        };

        let objects = match storage.list(&bucket.name, &bucket.folder).await {
            Ok(objects) => objects,
            Err(e) => {
                warn!("Listing bucket '{}' failed, using local images only: {}", bucket.name, e);
                return Vec::new();
            }
        };

        let urls: Vec<String> = objects
            .iter()
            .filter(|o| local::has_extension(&o.name, local::FEED_EXTENSIONS))
            .filter_map(|o| storage.public_url(&bucket.name, &bucket.folder, &o.name))
            .collect();
        debug!("Bucket '{}' contributed {} images", bucket.name, urls.len());

        if !probe_sizes {
            return urls
                .into_iter()
                .map(|url| ImageRecord {
                    url,
                    size_bytes: None,
                })
                .collect();
        }

        let sizes = join_all(urls.iter().map(|url| storage.content_length(url))).await;
        urls.into_iter()
            .zip(sizes)
            .map(|(url, size_bytes)| ImageRecord { url, size_bytes })
            .collect()
    }
}
