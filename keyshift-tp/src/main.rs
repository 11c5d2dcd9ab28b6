//! keyshift-tp (Transposer) - audio pitch transposition service
//!
//! Serves an upload page and `POST /transpose`, which shifts the pitch of an
//! uploaded mp3/wav by an explicit number of semitones or into a target key.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use keyshift_common::config::{load_toml_config, ConfigOverrides, ServiceConfig, TransposeMode};
use keyshift_tp::processing::FfmpegPitchShifter;
use keyshift_tp::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for keyshift-tp
#[derive(Parser, Debug)]
#[command(name = "keyshift-tp")]
#[command(about = "Audio pitch transposition service")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "KEYSHIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "KEYSHIFT_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "KEYSHIFT_PORT")]
    port: Option<u16>,

    /// Directory for per-request upload workspaces
    #[arg(short, long, env = "KEYSHIFT_UPLOADS_DIR")]
    uploads_dir: Option<PathBuf>,

    /// Transposition mode: "semitones" or "target_key"
    #[arg(short, long, env = "KEYSHIFT_MODE", value_parser = parse_mode)]
    mode: Option<TransposeMode>,

    /// ffmpeg binary (must include the rubberband filter)
    #[arg(long, env = "KEYSHIFT_FFMPEG")]
    ffmpeg: Option<PathBuf>,
}

fn parse_mode(s: &str) -> std::result::Result<TransposeMode, String> {
    s.parse::<TransposeMode>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    let overrides = ConfigOverrides {
        host: args.host,
        port: args.port,
        uploads_dir: args.uploads_dir,
        mode: args.mode,
        ffmpeg_path: args.ffmpeg,
    };
    let config = ServiceConfig::resolve(&overrides, &toml_config);

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "keyshift_tp={level},keyshift_common={level},tower_http={level}",
                level = config.log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting keyshift-tp v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        mode = %config.mode,
        uploads_dir = %config.uploads_dir.display(),
        ffmpeg = %config.ffmpeg_path.display(),
        max_upload_bytes = config.max_upload_bytes,
        "Configuration resolved"
    );

    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .with_context(|| format!("Failed to create uploads dir {}", config.uploads_dir.display()))?;

    let shifter = FfmpegPitchShifter::new(&config.ffmpeg_path);
    if shifter.check_available().await {
        info!("✓ ffmpeg available at {}", shifter.program().display());
    } else {
        warn!(
            "ffmpeg not runnable at {}; transpose requests will fail until it is installed",
            shifter.program().display()
        );
    }

    let addr = config.bind_address();
    let state = AppState::new(config, Arc::new(shifter));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("keyshift-tp listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
