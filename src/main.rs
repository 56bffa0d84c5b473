use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod batch;
mod config;
mod error;
mod media;
mod session;
#[cfg(test)]
mod testing;
mod utils;

use config::{Config, UrlEntry};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,

    /// Post URLs to download instead of the configured batch
    urls: Vec<String>,
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/tokgrab/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/tokgrab/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn init_logging(format: &str) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = get_config_path(&args);
    let mut config = match &config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };

    init_logging(config.get_logging_format());

    info!("Starting tokgrab...");
    match &config_path {
        Some(path) => info!("Loaded config from: {}", path),
        None => info!("No config file found, using defaults"),
    }

    if !args.urls.is_empty() {
        config.urls = args.urls.into_iter().map(UrlEntry::from).collect();
    }
    if config.urls.is_empty() {
        warn!("No URLs to process");
        return Ok(());
    }

    let session = Arc::new(
        session::HttpSession::new(config.request_timeout())
            .context("Failed to initialize HTTP session")?,
    );
    let storage = Arc::new(media::FsStorage::new());
    let orchestrator = batch::Orchestrator::new(&config, session, storage)?;

    let report = orchestrator.run(&config.urls).await;
    for (url, outcome) in &report.outcomes {
        match outcome {
            batch::Outcome::Downloaded(paths) => {
                for path in paths {
                    info!("{} -> {}", url, path.display());
                }
            }
            batch::Outcome::Skipped(reason) => warn!("{} skipped: {}", url, reason),
        }
    }
    info!(
        "Done: {} downloaded, {} skipped",
        report.downloaded(),
        report.skipped()
    );

    Ok(())
}
