use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medflow::config::Config;
use medflow::AppState;

#[derive(Parser, Debug)]
#[command(name = "medflow")]
#[command(author, version, about = "Clinic management server", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "MEDFLOW_CONFIG", default_value = "medflow.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve,
    /// Populate an empty database with demo users, patients and appointments
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config)?;

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

    tracing::info!("Starting MedFlow v{}", env!("CARGO_PKG_VERSION"));

    config.ensure_session_secret();

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.server.data_dir.display()
        )
    })?;

    let db = medflow::db::init(&config.server.data_dir).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Seed => {
            let summary = medflow::db::seed_demo_data(&db, chrono::Utc::now()).await?;
            if summary.skipped {
                tracing::warn!("Database is not empty; demo data was not seeded");
            }
            Ok(())
        }
        Commands::Serve => serve(config, db).await,
    }
}

async fn serve(config: Config, db: medflow::DbPool) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let production = config.server.production;

    let state = Arc::new(AppState::new(config, db));
    let app = medflow::api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(production, "API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
