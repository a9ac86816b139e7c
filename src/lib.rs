//! photofeed - image feed server for a photography site
//!
//! Serves the randomized carousel feed and the thin image listings used by
//! the public pages and the admin thumbnail picker.

pub mod api;
pub mod config;
pub mod feed;
pub mod storage;

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

pub use config::Config;
use feed::FeedAssembler;
use storage::StorageClient;

/// The photofeed server instance
pub struct Server {
    config: Config,
    storage: Option<StorageClient>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: Config) -> Result<Self> {
        let storage = match &config.storage {
            Some(storage_config) => Some(StorageClient::new(storage_config)?),
            None => None,
        };
        if storage.is_none() && config.feed.bucket.is_some() {
            warn!("Feed bucket configured without storage settings; remote images disabled");
        }
        if !config.public_root.is_dir() {
            warn!(
                "Public root {} is not a directory; image requests will fail",
                config.public_root.display()
            );
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            storage,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Build the router
    fn router(&self) -> Router {
        let assembler = FeedAssembler::new(self.config.public_root.clone(), self.storage.clone());
        api::router(self.config.clone(), assembler, self.storage.clone())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("photofeed listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("photofeed shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
