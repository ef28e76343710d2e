//! # Web Server Binary Entry Point
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin web_server -- --config config/server.toml
//! ```
//!
//! The server will:
//! 1. Load configuration from the TOML file (defaults when omitted)
//! 2. Initialize logging to stderr and the optional log file
//! 3. Prepare scratch storage and the codec worker pool
//! 4. Serve the API and static frontend until Ctrl-C

use clap::Parser;
use log::info;
use std::sync::Arc;

use stegano_web::common::config::AppConfig;
use stegano_web::server::{router, AppState};
use stegano_web::utils::logging::init_logger;

/// Command-line arguments for the web server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server configuration file (TOML format)
    ///
    /// Example: config/server.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address, overriding the configuration file
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::from_optional_file(args.config.as_deref())?;
    if let Some(address) = args.address {
        config.server.address = address;
    }

    init_logger(&config.logging.level, config.logging.file.as_deref())?;

    info!("🚀 Initializing web server...");

    let state = Arc::new(AppState::new(&config)?);
    info!(
        "📂 Upload dir: {} | 🧵 Worker pool: {}",
        state.scratch.path().display(),
        state.core.pool_size()
    );

    let app = router(state, &config);

    let addr = &config.server.address;
    info!("🌐 Web server running on http://{}", addr);
    info!("📡 API endpoints: /api/encode, /api/decode, /api/calculate");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("🛑 Shutting down");
        })
        .await?;

    Ok(())
}
