//! trackpd-report - health-monitoring report service
//!
//! Assembles the profile table, activity chart and tremor chart into a PDF
//! and serves it at `GET /RepPDF`. The report is generated once at startup
//! before the listener opens.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trackpd_common::config::{load_toml_config, resolve_config_path};
use trackpd_common::{StoreClient, StoreCredentials};
use trackpd_report::config::{CliOverrides, ReportFileConfig, ReportSettings};
use trackpd_report::pipeline::fetch::RecordSource;
use trackpd_report::{build_router, AppState, DeliveryGate, ReportPipeline};

/// Command-line arguments for trackpd-report
#[derive(Parser, Debug)]
#[command(name = "trackpd-report")]
#[command(about = "Health-monitoring report service for TrackPD")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "TRACKPD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "TRACKPD_REPORT_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TRACKPD_REPORT_PORT")]
    port: Option<u16>,

    /// Store credential file
    #[arg(long, env = "TRACKPD_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Directory the report and chart images are written to
    #[arg(short, long, env = "TRACKPD_REPORT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Seconds before a cached report is rebuilt (0 = only when missing)
    #[arg(long, env = "TRACKPD_REPORT_MAX_AGE")]
    max_age_secs: Option<u64>,

    /// Profile document to report on
    #[arg(long, env = "TRACKPD_PROFILE_ID")]
    profile_id: Option<String>,

    /// Owner of the activity events to chart
    #[arg(long, env = "TRACKPD_ACTIVITY_OWNER")]
    activity_owner: Option<String>,

    /// Generate the report once and exit without serving
    #[arg(long)]
    generate_only: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            credentials: self.credentials.clone(),
            output_dir: self.output_dir.clone(),
            max_age_secs: self.max_age_secs,
            profile_id: self.profile_id.clone(),
            activity_owner: self.activity_owner.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing exists so its level can seed the filter
    let config_path = resolve_config_path(args.config.as_deref());
    let file_config: ReportFileConfig = load_toml_config(config_path.as_deref())
        .context("Failed to load config file")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| file_config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting TrackPD Report (trackpd-report) v{} [{}] built {} ({})",
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

    let settings = ReportSettings::resolve(file_config, args.overrides())
        .context("Invalid report configuration")?;

    let credentials = StoreCredentials::load(&settings.credentials)
        .with_context(|| format!("Failed to load store credentials {}", settings.credentials.display()))?;
    let store = StoreClient::connect(&credentials)
        .await
        .context("Failed to open document store")?;
    info!("✓ Connected to store (project {})", store.project_id());

    let pipeline = ReportPipeline::new(settings.pipeline.clone());
    let source: Arc<dyn RecordSource> = Arc::new(store.clone());
    let gate = Arc::new(DeliveryGate::new(
        pipeline,
        source,
        settings.locators(),
        settings.cache_policy,
    ));

    if settings.regenerate_on_startup || args.generate_only {
        let report = gate
            .regenerate()
            .await
            .context("Startup report generation failed")?;
        info!("✓ Report ready at {}", report.artifact_path.display());
    }

    if args.generate_only {
        store.close().await;
        return Ok(());
    }

    let app = build_router(AppState::new(gate));

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("trackpd-report listening on http://{}", addr);
    info!("Report: http://{}/RepPDF", addr);

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
