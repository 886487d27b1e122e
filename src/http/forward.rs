//! Request forwarding engine.
//!
//! # Responsibilities
//! - Relay one request to one backend and return its response
//! - Report transport failures and timeouts as `ForwardError`
//!
//! # Design Decisions
//! - Forwarding is a trait so the router can be driven without sockets
//! - HTTP statuses from the backend are not errors; they are relayed as is

use std::future::Future;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::http::request::ReplayableRequest;
use crate::http::response::relay;
use crate::load_balancer::Backend;
use crate::resilience::UpstreamTimeouts;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

/// Capability to relay a request to a backend.
pub trait Forwarder: Send + Sync + 'static {
    fn forward(
        &self,
        backend: &Backend,
        request: &ReplayableRequest,
    ) -> impl Future<Output = Result<Response<Body>, ForwardError>> + Send;
}

/// Forwarder backed by the hyper-util pooled client.
#[derive(Clone)]
pub struct HyperForwarder {
    client: Client<HttpConnector, Body>,
    timeouts: UpstreamTimeouts,
}

impl HyperForwarder {
    pub fn new(timeouts: UpstreamTimeouts) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(timeouts.connector());
        Self { client, timeouts }
    }
}

impl Forwarder for HyperForwarder {
    async fn forward(
        &self,
        backend: &Backend,
        request: &ReplayableRequest,
    ) -> Result<Response<Body>, ForwardError> {
        let upstream: Request<Body> = request.to_upstream(backend)?;
        let response = self.timeouts.within(self.client.request(upstream)).await?;
        Ok(relay(response))
    }
}
