//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend addresses must be http URLs with a host
//! - Validate value ranges (intervals and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one backend is required")]
    NoBackends,

    #[error("backend address {address:?} is not a valid URL: {reason}")]
    InvalidBackendAddress { address: String, reason: String },

    #[error("backend address {address:?} uses unsupported scheme {scheme:?} (only http)")]
    UnsupportedScheme { address: String, scheme: String },

    #[error("backend address {address:?} has no host")]
    MissingHost { address: String },

    #[error("backend address {address:?} is listed more than once")]
    DuplicateBackend { address: String },

    #[error("bind address {address:?} is not a socket address")]
    InvalidBindAddress { address: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
}

/// Render a list of validation errors on one line.
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and check a single backend address.
pub fn parse_backend_address(address: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(address.trim()).map_err(|e| ValidationError::InvalidBackendAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(ValidationError::UnsupportedScheme {
            address: address.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host().is_none() {
        return Err(ValidationError::MissingHost {
            address: address.to_string(),
        });
    }
    Ok(url)
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        match parse_backend_address(&backend.address) {
            Ok(url) => {
                if !seen.insert(url.to_string()) {
                    errors.push(ValidationError::DuplicateBackend {
                        address: backend.address.clone(),
                    });
                }
            }
            Err(e) => errors.push(e),
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            address: config.listener.bind_address.clone(),
        });
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::ZeroValue { field: "health_check.interval_secs" });
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::ZeroValue { field: "health_check.timeout_secs" });
        }
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "timeouts.upstream_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
