use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drivedrop_core::{
    create_credential_provider, load_config, load_config_from_env, validate_config, Config,
    CredentialProvider, DriveUploader, Fetcher, JobOrchestrator, JobState, YtDlpFetcher,
};
use drivedrop_server::{api::create_router, metrics, state::AppState};

/// Default config file, used when present and `DRIVEDROP_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load()?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Credential method: {}", config.storage.credentials.method_name());
    info!("Destination folder: {}", config.storage.folder_id);
    info!(
        "Job mode: {:?}, response format: {:?}",
        config.jobs.mode, config.jobs.response_format
    );

    // Working directory for transient downloads
    tokio::fs::create_dir_all(&config.fetcher.working_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create working directory {:?}",
                config.fetcher.working_dir
            )
        })?;

    // Credentials are parsed up front so a broken key document stops startup
    let credentials: Arc<dyn CredentialProvider> = Arc::from(
        create_credential_provider(&config.storage.credentials)
            .context("Failed to create credential provider")?,
    );
    info!("Using credential provider: {}", credentials.method_name());

    let fetcher = YtDlpFetcher::new(config.fetcher.clone());
    if let Err(e) = fetcher.validate().await {
        warn!("yt-dlp is not usable yet, downloads will fail: {}", e);
    }

    let uploader =
        DriveUploader::new(config.uploader.clone()).context("Failed to create uploader")?;

    let orchestrator = JobOrchestrator::new(
        config.jobs.clone(),
        config.storage.folder_id.clone(),
        Arc::new(fetcher),
        Arc::new(uploader),
        credentials,
    )
    .with_update_callback(Arc::new(|_job_id: &str, state: JobState| {
        metrics::record_job_transition(state)
    }));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), orchestrator));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    Ok(())
}

/// Load from `DRIVEDROP_CONFIG`, then `config.toml`, then the environment.
fn load() -> Result<Config> {
    if let Ok(path) = std::env::var("DRIVEDROP_CONFIG") {
        let path = PathBuf::from(path);
        info!("Loading configuration from {:?}", path);
        return load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        info!("Loading configuration from {:?}", default_path);
        return load_config(&default_path)
            .with_context(|| format!("Failed to load config from {:?}", default_path));
    }

    info!("No config file found, using environment variables");
    load_config_from_env().context("Failed to load config from environment")
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
