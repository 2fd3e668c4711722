//! Service host.
//!
//! # Architecture Overview
//!
//! ```text
//!   SIGINT/SIGTERM ──▶ CancellationToken ─────────────────────────┐
//!                                                                 ▼
//!   ┌──────────────────────────── Supervisor ─────────────────────────────┐
//!   │                                                                     │
//!   │  rpc-server ◀── GracefulStop ── rpc-shutdown                        │
//!   │     │ x-request-id layer                                            │
//!   │     ▼                                                               │
//!   │  registered gRPC services ──▶ status translation + logging          │
//!   │                                                                     │
//!   │  http-server ◀── GracefulStop ── http-shutdown                      │
//!   │     ├── GET /metrics  (Prometheus)                                  │
//!   │     └── GET /health   (injected check)                              │
//!   └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use service_host::config::{load_config, validate_config, ConfigError};
use service_host::http::AlwaysHealthy;
use service_host::lifecycle::signals::shutdown_token;
use service_host::observability::{logging, metrics};
use service_host::{HttpServer, RpcServer, Supervisor};

#[derive(Parser)]
#[command(name = "service-host")]
#[command(about = "gRPC + HTTP service host", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "SERVICE_HOST_CONFIG")]
    config: Option<PathBuf>,

    /// Override the gRPC listen address.
    #[arg(long)]
    grpc_address: Option<String>,

    /// Override the HTTP listen address.
    #[arg(long)]
    http_address: Option<String>,

    /// Override the log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(addr) = cli.grpc_address {
        config.grpc_address = addr;
    }
    if let Some(addr) = cli.http_address {
        config.http_address = addr;
    }
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    let addrs = validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.log)?;
    let metrics_handle = metrics::init_metrics()?;

    tracing::info!(
        grpc_address = %addrs.grpc,
        http_address = %addrs.http,
        log_level = %config.log.level,
        "Configuration loaded"
    );

    let shutdown = shutdown_token();
    let mut supervisor = Supervisor::new();

    RpcServer::new(addrs.grpc).register(&mut supervisor);
    HttpServer::new(addrs.http, AlwaysHealthy, metrics_handle).register(&mut supervisor);

    if let Err(e) = supervisor.run(shutdown).await {
        tracing::error!(error = %e, "application terminated abnormally");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
