//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request + AttemptContext (context.rs)
//!     → router.rs
//!         - attempt ceiling check
//!         - ServerPool::get_next_peer
//!         - Forwarder::forward
//!         - on failure: RetryPolicy decides retry vs failover
//!     → Proxied response or 503
//! ```
//!
//! # Design Decisions
//! - Counters are passed explicitly, never stored globally
//! - Re-entry after failover is a loop bounded by the attempt ceiling

pub mod context;
pub mod router;

pub use context::AttemptContext;
pub use router::{RequestRouter, RouteError};
