//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe backends
//! - Write probe results into backend liveness

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::probe::is_backend_alive;
use crate::load_balancer::ServerPool;
use crate::observability::metrics;

pub struct HealthMonitor {
    pool: Arc<ServerPool>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(pool: Arc<ServerPool>, config: HealthCheckConfig) -> Self {
        Self { pool, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once and record the results.
    pub async fn check_all(&self) {
        tracing::debug!("Health check starting");
        let timeout = Duration::from_secs(self.config.timeout_secs);

        for backend in self.pool.backends() {
            let alive = is_backend_alive(backend, timeout).await;
            let was_alive = backend.is_alive();
            backend.set_alive(alive);

            if alive != was_alive {
                let status = if alive { "up" } else { "down" };
                tracing::info!(backend = %backend, status, "Backend status changed");
            }
            metrics::record_backend_alive(backend.address(), alive);
        }
        tracing::debug!("Health check completed");
    }
}
