use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use foodgram::cli::{Cli, Commands, ConfigCommands};
use foodgram::config::Config;
use foodgram::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Checking the config must not require a loadable config
    if let Some(Commands::Config(ConfigCommands::Check)) = &cli.command {
        return foodgram::cli::cmd_config_check(&cli.config);
    }

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &cli.command {
        Some(command) if !cli.is_serve() => foodgram::cli::run_command(command, &config).await,
        _ => serve(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting Foodgram v{}", env!("CARGO_PKG_VERSION"));

    let db = foodgram::db::init(&config).await?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, db.clone()));

    let app = foodgram::api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received");
}
