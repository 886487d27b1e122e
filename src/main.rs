//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                   LOAD BALANCER                       │
//!                              │                                                       │
//!     Client Request           │  ┌─────────┐    ┌──────────────┐    ┌─────────────┐  │
//!     ─────────────────────────┼─▶│  http   │───▶│   routing    │───▶│load_balancer│  │
//!                              │  │ server  │    │ router+retry │    │ pool+cursor │  │
//!                              │  └─────────┘    └──────┬───────┘    └─────────────┘  │
//!                              │                        │                 ▲            │
//!                              │                        ▼                 │            │
//!     Client Response          │  ┌─────────┐    ┌──────────────┐    ┌────┴────────┐  │
//!     ◀────────────────────────┼──│response │◀───│   forward    │    │   health    │  │
//!                              │  │  / 503  │    │ hyper client │    │   monitor   │  │
//!                              │  └─────────┘    └──────┬───────┘    └─────────────┘  │
//!                              └─────────────────────────┼────────────────────────────┘
//!                                                        ▼
//!                                                     Backends
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use lb_proxy::config::{read_config, BackendConfig, LogFormat, ProxyConfig};
use lb_proxy::lifecycle;
use lb_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "lb-proxy")]
#[command(about = "Round-robin HTTP load balancer", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated list of backend URLs
    #[arg(short, long, value_delimiter = ',')]
    backends: Vec<String>,

    /// Port to serve on
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds between health checks
    #[arg(long)]
    health_interval: Option<u64>,

    /// Log output format
    #[arg(long, value_parser = ["pretty", "json"])]
    log_format: Option<String>,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<String>,
}

impl Cli {
    /// Apply command-line flags on top of the file (or default) configuration.
    fn apply(self, mut config: ProxyConfig) -> ProxyConfig {
        if !self.backends.is_empty() {
            config.backends = self
                .backends
                .iter()
                .map(|b| b.trim())
                .filter(|b| !b.is_empty())
                .map(BackendConfig::from)
                .collect();
        }
        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{}", port);
        }
        if let Some(interval) = self.health_interval {
            config.health_check.interval_secs = interval;
        }
        if let Some(format) = self.log_format.as_deref() {
            config.observability.log_format = match format {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            };
        }
        if let Some(addr) = self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = addr;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    let config = cli.apply(config);

    logging::init(&config.observability);
    tracing::info!("lb-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = lifecycle::run(config).await {
        tracing::error!(error = %e, "Load balancer failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
