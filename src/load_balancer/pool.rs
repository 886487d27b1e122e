//! Backend pool management.
//!
//! # Responsibilities
//! - Own the ordered, fixed set of backends
//! - Select the next live peer in round-robin order
//! - Apply liveness updates by address

use std::sync::Arc;

use crate::config::validation::{parse_backend_address, ValidationError};
use crate::config::BackendConfig;
use crate::load_balancer::{backend::Backend, round_robin::RoundRobin};

/// The ordered set of backends plus the shared rotation cursor.
#[derive(Debug)]
pub struct ServerPool {
    backends: Vec<Arc<Backend>>,
    cursor: RoundRobin,
}

impl ServerPool {
    /// Create a pool from already-built backends.
    pub fn new(backends: Vec<Arc<Backend>>) -> Result<Self, ValidationError> {
        if backends.is_empty() {
            return Err(ValidationError::NoBackends);
        }
        Ok(Self {
            backends,
            cursor: RoundRobin::new(),
        })
    }

    /// Create a pool from configuration, preserving order.
    pub fn from_config(configs: &[BackendConfig]) -> Result<Self, ValidationError> {
        let mut backends = Vec::with_capacity(configs.len());
        for config in configs {
            let url = parse_backend_address(&config.address)?;
            tracing::info!(backend = %url, "Added backend");
            backends.push(Arc::new(Backend::new(url)));
        }
        Self::new(backends)
    }

    /// Advance the cursor and return its position modulo the pool size.
    pub fn next_index(&self) -> usize {
        self.cursor.next_index(self.backends.len())
    }

    /// Return the next live backend in rotation order.
    ///
    /// When the first candidate is dead, the cursor is moved onto the live
    /// backend that was found so the next caller starts from it.
    /// Returns `None` when every backend is dead.
    pub fn get_next_peer(&self) -> Option<Arc<Backend>> {
        let len = self.backends.len();
        let next = self.next_index();

        for offset in 0..len {
            let index = (next + offset) % len;
            let backend = &self.backends[index];
            if backend.is_alive() {
                if offset != 0 {
                    self.cursor.store(index);
                }
                return Some(backend.clone());
            }
        }
        None
    }

    /// Set liveness on the first backend whose address matches.
    pub fn mark_backend_status(&self, address: &str, alive: bool) {
        match self.backends.iter().find(|b| b.address() == address) {
            Some(backend) => backend.set_alive(alive),
            None => tracing::debug!(address = %address, "Status update for unknown backend ignored"),
        }
    }

    /// All backends, in configuration order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Number of backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Always false for a constructed pool.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Raw cursor value, for inspection.
    pub fn cursor(&self) -> u64 {
        self.cursor.current()
    }
}
