//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (connect timeout + upstream deadline)
//!     → On failure: retries.rs
//!         - retry same backend (bounded, fixed delay)
//!         - or demote backend and fail over
//! ```
//!
//! # Design Decisions
//! - Every upstream call has a deadline
//! - Only transport failures and timeouts are retried; HTTP statuses are relayed
//! - The attempt ceiling guarantees every request terminates

pub mod retries;
pub mod timeouts;

pub use retries::{FailureAction, RetryPolicy};
pub use timeouts::UpstreamTimeouts;
