//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) and command-line flags
//!     → loader.rs (parse & deserialize)
//!     → flag overrides applied by the binary
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    BackendConfig, HealthCheckConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig,
    RetryConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
