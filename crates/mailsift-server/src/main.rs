//! Mailsift Server CLI
//!
//! Starts the HTTP server for email parsing.

use anyhow::{Context, Result};
use clap::Parser;
use mailsift_server::{config::ServerConfig, start_server};
use std::path::PathBuf;

/// Mailsift - extract customer records from raw emails over HTTP.
#[derive(Debug, Parser)]
#[command(name = "mailsift-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MAILSIFT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => ServerConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            eprintln!("Warning: No config file specified, using default test configuration");
            eprintln!("Usage: mailsift-server --config <path-to-config.toml>");
            eprintln!();
            ServerConfig::default_test_config()
        }
    };

    start_server(config).await.context("Server terminated")?;

    Ok(())
}
