//! Timeout enforcement.
//!
//! # Responsibilities
//! - Configure the connector's connect timeout
//! - Bound each upstream exchange with a deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - An expired deadline is an ordinary forwarding failure and goes
//!   through the retry/failover policy

use std::future::Future;
use std::time::Duration;

use hyper_util::client::legacy::connect::HttpConnector;

use crate::config::TimeoutConfig;
use crate::http::forward::ForwardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    pub connect: Duration,
    pub upstream: Duration,
}

impl UpstreamTimeouts {
    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            upstream: Duration::from_secs(config.upstream_secs),
        }
    }

    /// HTTP connector honouring the connect timeout.
    pub fn connector(&self) -> HttpConnector {
        let mut connector = HttpConnector::new();
        if !self.connect.is_zero() {
            connector.set_connect_timeout(Some(self.connect));
        }
        connector.set_nodelay(true);
        connector
    }

    /// Run an upstream exchange under the upstream deadline.
    pub async fn within<F, T, E>(&self, exchange: F) -> Result<T, ForwardError>
    where
        F: Future<Output = Result<T, E>>,
        ForwardError: From<E>,
    {
        match tokio::time::timeout(self.upstream, exchange).await {
            Ok(result) => result.map_err(ForwardError::from),
            Err(_) => Err(ForwardError::Timeout(self.upstream)),
        }
    }
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self::from_config(&TimeoutConfig::default())
    }
}
