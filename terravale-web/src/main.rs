//! Terravale Web Server
//!
//! REST API for the Terravale Ventures portals.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use terravale_core::{init_logging, TerravaleConfig};
use terravale_web::{config_validator, server::TerravaleServer};

/// Terravale Web Server - accounts, sessions and portal endpoints
#[derive(Parser)]
#[command(name = "terravale-web")]
#[command(about = "REST API for the Terravale Ventures portals")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// Credential store URL, e.g. sqlite://terravale.db
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Validate configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load .env before reading the environment
    dotenvy::dotenv().ok();

    let mut config =
        TerravaleConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Command line flags win over file and environment
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.dev {
        config.server.dev_mode = true;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = Some(database_url);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging).map_err(|e| anyhow::anyhow!(e))?;

    config_validator::validate_config(&config)?;
    if args.check {
        tracing::info!("Configuration OK");
        return Ok(());
    }

    let server = TerravaleServer::new(config)
        .await
        .context("Failed to build server")?;
    server.start().await?;

    Ok(())
}
