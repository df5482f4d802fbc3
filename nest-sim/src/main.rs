//! nest-sim (Simulation Budget) - Influencer budget simulation dashboard
//!
//! Serves the login-gated Simulation Budget pages and JSON API.
//!
//! Settings resolve CLI > environment > TOML > compiled default:
//! - port: `--port` / `NEST_SIM_PORT` / `port` / 5780
//! - bind: `--bind` / `NEST_SIM_BIND` / `bind` / 127.0.0.1
//! - weights: `--weights-url` / `NEST_WEIGHTS_URL` / `weights_url` / published export

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nest_common::config::{load_config, resolve_setting, DEFAULT_WEIGHTS_URL};
use nest_common::{CredentialVerifier, StaticCredentials};
use nest_sim::{build_router, AppState, LocationSource, WeightsCache};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

const DEFAULT_PORT: u16 = 5780;
const DEFAULT_BIND: &str = "127.0.0.1";

/// Command-line arguments for nest-sim
#[derive(Parser, Debug)]
#[command(name = "nest-sim")]
#[command(about = "Influencer budget simulation dashboard")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Weights source: http(s) URL, file:// URL or path
    #[arg(short, long)]
    weights_url: Option<String>,

    /// TOML config file (default: <config dir>/nest/nest-sim.toml)
    #[arg(short, long, env = "NEST_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing; the filter is swapped for the TOML level below
    // unless RUST_LOG is set
    let env_filter_set = std::env::var("RUST_LOG").is_ok();
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Nest Simulation Budget (nest-sim) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = load_config(args.config.as_deref(), "nest-sim")
        .context("Failed to load configuration")?;

    if !env_filter_set {
        if let Some(filter) = config_log_filter(&config.logging.level) {
            if let Err(e) = filter_handle.reload(filter) {
                warn!("Failed to apply log level '{}': {}", config.logging.level, e);
            }
        }
    }

    let port = resolve_setting(args.port, "NEST_SIM_PORT", config.port, DEFAULT_PORT);
    let bind = resolve_setting(
        args.bind,
        "NEST_SIM_BIND",
        config.bind.clone(),
        DEFAULT_BIND.to_string(),
    );
    let weights_url = resolve_setting(
        args.weights_url,
        "NEST_WEIGHTS_URL",
        config.weights_url.clone(),
        DEFAULT_WEIGHTS_URL.to_string(),
    );
    info!("Weights source: {}", weights_url);

    let credentials: Arc<dyn CredentialVerifier> = if config.users.is_empty() {
        info!("Using built-in login allow-list");
        Arc::new(StaticCredentials::builtin())
    } else {
        info!("Using {} configured login(s)", config.users.len());
        Arc::new(StaticCredentials::from_config(&config.users))
    };

    let source = LocationSource::new().context("Failed to initialize weights source")?;
    let cache = WeightsCache::new(Arc::new(source));
    let state = AppState::new(weights_url, cache, credentials);

    // Warm the cache; a failure here is reported again on every page until
    // the source becomes reachable
    match state.weights_table().await {
        Ok(table) => info!(
            "✓ Weights table ready ({} rows, {} categories)",
            table.len(),
            table.categories().len()
        ),
        Err(e) => error!("Weights table unavailable at startup: {}", e),
    }

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", bind, port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("nest-sim listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Filter for the TOML `[logging] level`; `None` (with a warning) when the
/// directive does not parse
fn config_log_filter(level: &str) -> Option<EnvFilter> {
    match EnvFilter::try_new(level) {
        Ok(filter) => Some(filter),
        Err(e) => {
            warn!("Invalid log level '{}' in config, keeping 'info': {}", level, e);
            None
        }
    }
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
