//! Common test utilities - FeedTest harness and a mock object store

use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::{Path as UrlPath, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use photofeed::storage::StorageConfig;
use photofeed::{Config, Server};
use reqwest::Client;
use serde::Deserialize;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Pick a free local port
pub fn free_addr() -> Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Write a file of `len` bytes below `root`, creating parent directories
pub fn write_file(root: &Path, rel: &str, len: usize) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("file has a parent")).expect("create dirs");
    fs::write(path, vec![0u8; len]).expect("write file");
}

/// Test harness that spawns a real photofeed server on a random port
/// with a temporary public root
pub struct FeedTest {
    pub addr: SocketAddr,
    pub client: Client,
    pub site: TempDir,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl FeedTest {
    /// Start a server over an empty public root with default config
    pub async fn start() -> Result<Self> {
        Self::start_with(|_| {}, |_| {}).await
    }

    /// Start a server after populating the site and adjusting the config
    pub async fn start_with(
        populate: impl FnOnce(&Path),
        configure: impl FnOnce(&mut Config),
    ) -> Result<Self> {
        let site = TempDir::new()?;
        populate(site.path());

        let mut config = Config {
            bind_addr: free_addr()?,
            public_root: site.path().to_path_buf(),
            ..Config::default()
        };
        configure(&mut config);
        let addr = config.bind_addr;

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        wait_ready(&client, &format!("http://{}/health", addr)).await;

        Ok(Self {
            addr,
            client,
            site,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// GET a path and decode the JSON array of URLs
    pub async fn feed(&self, path: &str) -> Result<Vec<String>> {
        let resp = self.get(path).await?;
        anyhow::ensure!(resp.status() == 200, "feed returned {}", resp.status());
        Ok(resp.json().await?)
    }
}

impl Drop for FeedTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}

/// Poll until the server answers (max 2 seconds)
async fn wait_ready(client: &Client, url: &str) {
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if client.get(url).send().await.is_ok() {
            return;
        }
    }
    panic!("Server failed to start within 2 seconds");
}

/// API key the mock store expects
pub const MOCK_API_KEY: &str = "test-anon-key";

/// Object held by the mock store; `None` size means HEAD/GET return 404
#[derive(Clone)]
struct MockObject {
    size: Option<usize>,
}

#[derive(Clone, Default)]
struct MockState {
    /// bucket -> object path -> object
    buckets: Arc<BTreeMap<String, BTreeMap<String, MockObject>>>,
}

/// Minimal object store speaking the list/public-object REST surface
pub struct MockStorage {
    pub addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl MockStorage {
    /// Start a store; objects are `(bucket, path, size)` where `None` size is
    /// listed but not downloadable. The bucket named `broken` fails listings.
    pub async fn start(objects: &[(&str, &str, Option<usize>)]) -> Result<Self> {
        let mut buckets: BTreeMap<String, BTreeMap<String, MockObject>> = BTreeMap::new();
        for (bucket, path, size) in objects {
            buckets
                .entry(bucket.to_string())
                .or_default()
                .insert(path.to_string(), MockObject { size: *size });
        }
        let state = MockState {
            buckets: Arc::new(buckets),
        };

        let app = Router::new()
            .route("/storage/v1/object/list/{bucket}", post(mock_list))
            .route("/storage/v1/object/public/{bucket}/{*path}", get(mock_object))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    /// Base URL to put in the storage config
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Storage settings pointing at this store
    pub fn config(&self) -> StorageConfig {
        StorageConfig {
            url: self.url(),
            api_key: MOCK_API_KEY.to_string(),
            ..StorageConfig::default()
        }
    }

    /// Public URL of an object in this store
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.url(), bucket, path)
    }
}

#[derive(Deserialize)]
struct ListBody {
    #[serde(default)]
    prefix: String,
    limit: usize,
}

async fn mock_list(
    UrlPath(bucket): UrlPath<String>,
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<ListBody>,
) -> impl IntoResponse {
    let authorized = headers
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == MOCK_API_KEY);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "missing apikey").into_response();
    }
    if bucket == "broken" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable").into_response();
    }
    let Some(objects) = state.buckets.get(&bucket) else {
        return (StatusCode::NOT_FOUND, "bucket not found").into_response();
    };

    let prefix = if body.prefix.is_empty() {
        String::new()
    } else {
        format!("{}/", body.prefix.trim_end_matches('/'))
    };

    // Direct children only; nested paths show up as a folder entry
    let mut names: Vec<String> = Vec::new();
    for path in objects.keys() {
        let Some(rest) = path.strip_prefix(&prefix) else {
            continue;
        };
        let name = rest.split('/').next().unwrap_or(rest).to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names.truncate(body.limit);

    let entries: Vec<serde_json::Value> = names
        .into_iter()
        .map(|name| serde_json::json!({ "name": name, "id": null }))
        .collect();
    Json(entries).into_response()
}

async fn mock_object(
    UrlPath((bucket, path)): UrlPath<(String, String)>,
    State(state): State<MockState>,
) -> impl IntoResponse {
    let size = state
        .buckets
        .get(&bucket)
        .and_then(|objects| objects.get(&path))
        .and_then(|o| o.size);

    match size {
        Some(size) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/jpeg".to_string()),
                (header::CONTENT_LENGTH, size.to_string()),
            ],
            vec![0u8; size],
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "object not found").into_response(),
    }
}
