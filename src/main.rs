mod client_ip;
mod config;
mod db;
mod email;
mod error;
mod geo;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod state;
mod sweeper;
mod validate;
mod views;

use clap::Parser; // for cli
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::state::AppState;

// this is main async function with tokio
#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // parse cli arguments
    let args = Args::parse();

    // creating shared state
    let state = Arc::new(AppState::from_args(&args));

    if !state.mailer.is_configured() {
        warn!("BREVO_API_KEY not set - contact and visit mails will fail with 500");
    }

    // spawn the background sweeper
    if args.sweep_interval > 0 {
        let sweeper_state = Arc::clone(&state);
        let sweep_interval = Duration::from_secs(args.sweep_interval);
        tokio::spawn(async move {
            sweeper::rate_limit_sweeper(sweeper_state, sweep_interval).await;
        });
    }

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(port = args.port, "portfolio relay listening");
    info!(
        "Rate limit: {} requests per {} seconds",
        args.rate_limit, args.rate_window
    );
    info!(
        database = args.database_url().is_some(),
        record_views = args.record_views,
        geo = %args.geo_api_url,
        "visit tracking"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("portfolio relay stopped");
    Ok(())
}

// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
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
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
