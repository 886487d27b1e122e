//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server by its base URL
//! - Track liveness behind a reader/writer lock
//! - Derive upstream URIs and probe targets from the base URL

use std::fmt;

use axum::http::Uri;
use parking_lot::RwLock;
use url::{Host, Position, Url};

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Base URL of the backend, immutable after creation.
    url: Url,
    /// Liveness flag. Readers never block each other.
    alive: RwLock<bool>,
}

impl Backend {
    /// Create a new backend. Backends start out alive.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            alive: RwLock::new(true),
        }
    }

    /// The backend's base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Normalized address string, used to identify the backend in the pool.
    pub fn address(&self) -> &str {
        self.url.as_str()
    }

    /// Update the liveness flag.
    pub fn set_alive(&self, alive: bool) {
        *self.alive.write() = alive;
    }

    /// Read the liveness flag.
    pub fn is_alive(&self) -> bool {
        *self.alive.read()
    }

    /// `host:port` pair a TCP probe should connect to.
    ///
    /// IPv6 literals are returned without brackets so they resolve directly.
    pub fn probe_target(&self) -> Option<(String, u16)> {
        let port = self.url.port_or_known_default()?;
        let host = match self.url.host()? {
            Host::Domain(domain) => domain.to_string(),
            Host::Ipv4(ip) => ip.to_string(),
            Host::Ipv6(ip) => ip.to_string(),
        };
        Some((host, port))
    }

    /// Build the upstream URI for an inbound path and query.
    ///
    /// The backend's base path is prefixed to the inbound path, so a backend
    /// configured as `http://10.0.0.1:9000/api` receives `/users` as `/api/users`.
    pub fn upstream_uri(&self, path_and_query: &str) -> Result<Uri, axum::http::Error> {
        let base_path = self.url.path().trim_end_matches('/');
        let authority = &self.url[Position::BeforeHost..Position::AfterPort];
        let path_and_query = if path_and_query.starts_with('/') {
            path_and_query.to_string()
        } else {
            format!("/{}", path_and_query)
        };

        let uri = format!(
            "{}://{}{}{}",
            self.url.scheme(),
            authority,
            base_path,
            path_and_query
        );
        Uri::try_from(uri).map_err(axum::http::Error::from)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.address())
    }
}
