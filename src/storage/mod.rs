//! Object storage client
//!
//! Talks to a hosted storage service with a Supabase-compatible REST API:
//! - Flat listing of one folder in a bucket
//! - Public URL derivation for stored objects
//! - HEAD probes to read object sizes

use std::time::Duration;

use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default page size of a listing call
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Storage connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the storage project, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Key sent as both `apikey` and bearer token
    pub api_key: String,
    pub list_limit: u32,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            list_limit: DEFAULT_LIST_LIMIT,
            timeout_secs: 10,
        }
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage url: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// One entry of a bucket listing
#[derive(Debug, Clone, Deserialize)]
pub struct StoredObject {
    pub name: String,
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: u32,
    offset: u32,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Debug, Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

/// Object storage client
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base: Url,
    api_key: String,
    list_limit: u32,
}

impl StorageClient {
    /// Create a client from connection settings
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let base = Url::parse(&config.url)
            .map_err(|e| StorageError::InvalidUrl(format!("{}: {}", config.url, e)))?;
        if base.cannot_be_a_base() {
            return Err(StorageError::InvalidUrl(config.url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base,
            api_key: config.api_key.clone(),
            list_limit: config.list_limit,
        })
    }

    /// Build a URL from the base plus path segments, percent-encoding each
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Option<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().ok()?;
            path.pop_if_empty();
            for segment in segments {
                if !segment.is_empty() {
                    path.push(segment);
                }
            }
        }
        Some(url)
    }

    /// List the objects directly inside `folder` of `bucket`
    ///
    /// Single call, not recursive. Sub-folders appear as entries too.
    pub async fn list(&self, bucket: &str, folder: &str) -> Result<Vec<StoredObject>, StorageError> {
        let url = self
            .endpoint(["storage", "v1", "object", "list", bucket])
            .ok_or_else(|| StorageError::InvalidUrl(self.base.to_string()))?;

        debug!("Listing bucket '{}' folder '{}'", bucket, folder);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&ListRequest {
                prefix: folder,
                limit: self.list_limit,
                offset: 0,
                sort_by: SortBy {
                    column: "name",
                    order: "asc",
                },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status { status, body });
        }

        let objects: Vec<StoredObject> = response.json().await?;
        debug!("Bucket '{}' listed {} entries", bucket, objects.len());
        Ok(objects)
    }

    /// Public URL of an object: `{base}/storage/v1/object/public/{bucket}/{folder}/{name}`
    pub fn public_url(&self, bucket: &str, folder: &str, name: &str) -> Option<String> {
        let segments = ["storage", "v1", "object", "public", bucket]
            .into_iter()
            .chain(folder.split('/'))
            .chain(std::iter::once(name));
        self.endpoint(segments).map(String::from)
    }

    /// Read an object's size with a HEAD request
    ///
    /// Any failure yields `None` so the object sorts after known sizes.
    pub async fn content_length(&self, url: &str) -> Option<u64> {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("HEAD {} returned {}", url, response.status());
            return None;
        }

        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}
