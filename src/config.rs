//! Server configuration
//!
//! Layered with figment, lowest priority first:
//! 1. Built-in defaults
//! 2. TOML file (`photofeed.toml` unless another path is given)
//! 3. `PHOTOFEED_*` environment variables, nested keys split on `__`
//!
//! CLI flags are merged on top by the binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::feed::FeedOptions;
use crate::storage::StorageConfig;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "photofeed.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PHOTOFEED_";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Site's public directory; image URLs are relative to it
    pub public_root: PathBuf,
    /// Carousel feed defaults, overridable per request
    pub feed: FeedOptions,
    /// Story folders live under this directory of the public root
    pub stories_dir: String,
    pub uploads_dir: String,
    /// Bucket shown by the thumbnail picker listing
    pub thumbnails_bucket: String,
    /// Object storage; remote sources are skipped when unset
    pub storage: Option<StorageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            public_root: PathBuf::from("public"),
            feed: FeedOptions::default(),
            stories_dir: "stories".to_string(),
            uploads_dir: "uploads".to_string(),
            thumbnails_bucket: "story-thumbnails".to_string(),
            storage: None,
        }
    }
}

impl Config {
    /// Layered configuration sources, ready for extra CLI overrides
    pub fn figment(file: Option<&Path>) -> Figment {
        let file = file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from defaults, file, and environment
    pub fn load(file: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(file).extract()
    }
}
