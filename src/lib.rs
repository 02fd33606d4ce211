pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;
pub mod visibility;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Init => {
            if Config::create_default_if_missing()? {
                println!("Config file created. Add your API keys to config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it alone.");
            }
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    info!("aisov v{} starting", env!("CARGO_PKG_VERSION"));

    let state = api::create_app_state_from_config(config.clone()).await?;
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("dashboard running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => error!("error listening for shutdown: {}", e),
    }
}
