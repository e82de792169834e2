//! Libris server binary
//!
//! Starts the HTTP API for the library record keeper.

use anyhow::{Context, Result};
use clap::Parser;
use libris_server::{config::ServerConfig, start_server};
use std::path::PathBuf;

/// Library record keeper: catalog, readers, and loans over HTTP
#[derive(Parser, Debug)]
#[command(name = "libris-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "LIBRIS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the database path from the config
    #[arg(long)]
    database: Option<String>,

    /// Override the bind port from the config
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            eprintln!("Warning: No config file specified, using default test configuration");
            eprintln!("Usage: libris-server --config <path-to-config.toml>");
            eprintln!();
            ServerConfig::default_test_config()
        }
    };

    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(port) = cli.port {
        config.bind_port = port;
    }

    start_server(config).await?;
    Ok(())
}
