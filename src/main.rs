//! NetSuite existence-check gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ ┌──────────────────────────── pipeline ────────────────────────────┐
//!                     │ correlation → security gate → rate limiter → request logger      │
//!                     └──────────────────────────────┬───────────────────────────────────┘
//!                                                    ▼
//!                                            ┌──────────────┐
//!                                            │   handlers   │
//!                                            └──────┬───────┘
//!                                                   ▼
//!                                        ┌─────────────────────┐
//!                                        │ existence validator │
//!                                        └────┬───────────┬────┘
//!                                   customer  │           │  contact
//!                                             ▼           ▼
//!                                      ┌───────────────────────┐
//!                                      │ signed SuiteQL client │──────▶ NetSuite
//!                                      └───────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use netsuite_gateway::config::loader;
use netsuite_gateway::observability::{logging, metrics};
use netsuite_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "netsuite-gateway")]
#[command(about = "Existence-check gateway in front of NetSuite SuiteQL", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables are applied on top.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = loader::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("netsuite-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        netsuite = %config.netsuite.base_url,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_ms = config.rate_limit.window_ms,
        api_keys = config.security.api_keys.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    shutdown.trigger();
    tracing::info!("Shutdown complete");
    Ok(())
}
