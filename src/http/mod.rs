//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (buffer body, keep request replayable)
//!     → [routing layer picks a backend and drives retries]
//!     → forward.rs (hyper client relays to backend)
//!     → response.rs (strip hop-by-hop headers, or 503)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardError, Forwarder, HyperForwarder};
pub use request::{ReplayableRequest, X_REQUEST_ID};
pub use server::HttpServer;
