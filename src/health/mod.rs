//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend (probe.rs, bare TCP connect)
//!     → Backend::set_alive
//!
//! Passive demotion (routing::router):
//!     Forwarding fails after all same-backend retries
//!     → ServerPool::mark_backend_status(address, false)
//! ```
//!
//! # Design Decisions
//! - Probing is a pure check; only the monitor writes liveness
//! - A single failed probe marks a backend dead, a single success revives it
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod probe;

pub use active::HealthMonitor;
pub use probe::{is_backend_alive, DEFAULT_PROBE_TIMEOUT};
