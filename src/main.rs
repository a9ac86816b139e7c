//! photofeed - image feed server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use figment::providers::Serialized;
use photofeed::{Config, Server};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Randomized image feed server
#[derive(Parser, Debug)]
#[command(name = "photofeed", version, about = "Serve carousel image feeds")]
struct Args {
    /// Configuration file (defaults to ./photofeed.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Site public directory containing the image folders
    #[arg(long)]
    public_root: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "photofeed=info,tower_http=debug".into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut figment = Config::figment(args.config.as_deref());
    if let Some(bind) = args.bind {
        figment = figment.merge(Serialized::default("bind_addr", bind));
    }
    if let Some(public_root) = &args.public_root {
        figment = figment.merge(Serialized::default("public_root", public_root));
    }
    let config: Config = figment.extract()?;
    info!("Serving images from {}", config.public_root.display());

    // Create and run server
    let server = Arc::new(Server::new(config).await?);
    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            signal_server.shutdown();
        }
    });
    server.run().await?;

    Ok(())
}
