//! trackpd-ingest - tremor sample ingestion service
//!
//! Accepts `POST /tremor` from the watch client and appends each sample,
//! stamped with the local capture time, to the document store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trackpd_common::config::{load_toml_config, resolve_config_path};
use trackpd_common::{StoreClient, StoreCredentials};
use trackpd_ingest::config::IngestFileConfig;
use trackpd_ingest::{build_router, AppState};

/// Command-line arguments for trackpd-ingest
#[derive(Parser, Debug)]
#[command(name = "trackpd-ingest")]
#[command(about = "Tremor sample ingestion service for TrackPD")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "TRACKPD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "TRACKPD_INGEST_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TRACKPD_INGEST_PORT")]
    port: Option<u16>,

    /// Store credential file
    #[arg(long, env = "TRACKPD_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Collection samples are appended to
    #[arg(long, env = "TRACKPD_INGEST_COLLECTION")]
    collection: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let mut config: IngestFileConfig = load_toml_config(config_path.as_deref())
        .context("Failed to load config file")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting TrackPD Ingest (trackpd-ingest) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        Some(path) => warn!("Config file {} not found; using defaults", path.display()),
        None => info!("No config file; using defaults"),
    }

    if let Some(host) = args.host {
        config.ingest.host = host;
    }
    if let Some(port) = args.port {
        config.ingest.port = port;
    }
    if let Some(collection) = args.collection {
        config.ingest.collection = collection;
    }
    let credentials_path = args.credentials.unwrap_or(config.store.credentials);

    let credentials = StoreCredentials::load(&credentials_path)
        .with_context(|| format!("Failed to load store credentials {}", credentials_path.display()))?;
    let store = StoreClient::connect(&credentials)
        .await
        .context("Failed to open document store")?;
    info!(
        "✓ Connected to store (project {}), writing to collection '{}'",
        store.project_id(),
        config.ingest.collection
    );

    let app = build_router(AppState::new(store.clone(), config.ingest.collection.clone()));

    let addr = config.ingest.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("trackpd-ingest listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
