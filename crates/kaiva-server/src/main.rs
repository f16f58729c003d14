//! Kaiva Server CLI
//!
//! Starts the lease abstraction HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use kaiva_server::{config::ServerConfig, start_server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kaiva-server")]
#[command(about = "Lease abstraction HTTP server", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "KAIVA_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address as address:port (overrides config and KAIVA_BIND)
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory for generated spreadsheets
    #[arg(long)]
    artifact_dir: Option<PathBuf>,

    /// Chat model name
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config =
        ServerConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Failed to read configuration from the environment".to_string(),
        })?;

    if let Some(bind) = &cli.bind {
        config.set_bind(bind)?;
    }
    if let Some(dir) = cli.artifact_dir {
        config.artifact_dir = dir;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }

    config
        .validate()
        .context("Set OPENAI_API_KEY or openai_api_key in the config file")?;

    start_server(config).await?;

    Ok(())
}
