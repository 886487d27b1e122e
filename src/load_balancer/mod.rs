//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (advance cursor, scan for a live backend)
//!         - round_robin.rs (atomic rotation cursor)
//!         - backend.rs (address + liveness flag)
//!     → Return backend or None when every backend is dead
//! ```
//!
//! # Design Decisions
//! - Pool membership is fixed at startup
//! - Cursor is a lock-free atomic; liveness is a per-backend RwLock
//! - Dead backends are skipped, never selected

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::ServerPool;
