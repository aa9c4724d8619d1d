use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;

use config::{AppState, ServerConfig, DEFAULT_HOST, DEFAULT_SERVER_NAME};

#[derive(Parser, Debug)]
#[command(name = "ssemcp")]
#[command(about = "Minimal MCP server over Server-Sent Events", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SSEMCP_CONFIG", default_value = "ssemcp.toml")]
    config: PathBuf,

    /// Port to listen on (defaults to $PORT, then 8001)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server identity reported to clients (kebab-case)
    #[arg(long, default_value = DEFAULT_SERVER_NAME)]
    name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ssemcp=info,tower_http=info".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    let port = config::resolve_port(args.port, std::env::var("PORT").ok().as_deref())?;
    config::validate_server_name(&args.name)?;

    tracing::info!("Starting {} MCP server", args.name);

    // Load configuration
    let config = ServerConfig::load(&args.config)?;
    let state = AppState::new(&args.name, &config)?;

    let addr = format!("{}:{}", args.host, port);
    api::serve(&addr, state).await?;

    Ok(())
}
