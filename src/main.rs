//! Body-override proxy.
//!
//! An intercepting HTTP proxy that runs a chain of modifiers around every
//! transaction. The shipped `body.Modifier` replaces response bodies and,
//! when scoped to the request phase too, serves them without contacting
//! the upstream at all.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌──────────┐   ┌──────────────┐   ┌────────────┐
//!     ──────────────────▶│  http    │──▶│ modifier     │──▶│  upstream  │───▶ Backend
//!                        │  server  │   │ chain (req)  │   │  client    │
//!                        └──────────┘   └──────┬───────┘   └─────┬──────┘
//!                                              │ skip round trip │
//!                                              ▼                 ▼
//!     Client Response    ┌──────────────────────────────────────────────┐
//!     ◀──────────────────│       modifier chain (response phase)        │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use body_override_proxy::config::validation::validate_config;
use body_override_proxy::config::{load_modifiers, parse_config, ConfigError, ProxyConfig};
use body_override_proxy::modifier::{ModifierChain, Registry};
use body_override_proxy::observability::{logging, metrics};
use body_override_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "body-override-proxy")]
#[command(about = "Intercepting HTTP proxy with response body overrides", long_about = None)]
struct Cli {
    /// Proxy configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Modifier document (JSON). Overrides `modifiers.path`.
    #[arg(short, long)]
    modifiers: Option<PathBuf>,

    /// Bind address. Overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => parse_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(path) = cli.modifiers {
        config.modifiers.path = Some(path);
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level)?;

    tracing::info!("body-override-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let registry = Registry::with_builtin();
    let chain = match &config.modifiers.path {
        Some(path) => load_modifiers(path, &registry)?,
        None => {
            tracing::warn!("No modifier document configured; proxying unmodified");
            ModifierChain::new()
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        modifier_types = ?registry.names(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Listening for connections");

    let server = HttpServer::new(config, chain);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
