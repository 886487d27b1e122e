//! TCP liveness probe.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;

use crate::load_balancer::Backend;

/// Default connect deadline for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Return true if the backend accepts a TCP connection within `timeout`.
///
/// The connection is closed as soon as it is established; no bytes are exchanged.
/// This does not touch the backend's liveness flag.
pub async fn is_backend_alive(backend: &Backend, timeout: Duration) -> bool {
    let Some((host, port)) = backend.probe_target() else {
        tracing::warn!(backend = %backend, "Site unreachable: no host or port");
        return false;
    };

    match time::timeout(timeout, TcpStream::connect((host.as_str(), port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            true
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = %backend, error = %e, "Site unreachable");
            false
        }
        Err(_) => {
            tracing::warn!(backend = %backend, timeout = ?timeout, "Site unreachable: connect timed out");
            false
        }
    }
}
