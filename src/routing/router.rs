//! Request router.
//!
//! Picks a live backend for each inbound request and drives the retry and
//! failover state machine until the request completes or is rejected.

use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use thiserror::Error;

use crate::http::forward::{ForwardError, Forwarder};
use crate::http::request::ReplayableRequest;
use crate::http::response::service_unavailable;
use crate::load_balancer::{Backend, ServerPool};
use crate::observability::metrics;
use crate::resilience::{FailureAction, RetryPolicy};
use crate::routing::AttemptContext;

/// Terminal failure for one inbound request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("max attempts reached ({attempts})")]
    AttemptsExhausted { attempts: u32 },

    #[error("no live backend available")]
    NoPeerAvailable,
}

impl RouteError {
    /// Metric label for this outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            RouteError::AttemptsExhausted { .. } => "exhausted",
            RouteError::NoPeerAvailable => "no_peer",
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> axum::response::Response {
        service_unavailable()
    }
}

pub struct RequestRouter<F> {
    pool: Arc<ServerPool>,
    forwarder: F,
    policy: RetryPolicy,
}

impl<F: Forwarder> RequestRouter<F> {
    pub fn new(pool: Arc<ServerPool>, forwarder: F, policy: RetryPolicy) -> Self {
        Self {
            pool,
            forwarder,
            policy,
        }
    }

    pub fn pool(&self) -> &Arc<ServerPool> {
        &self.pool
    }

    /// Route a request, starting from `ctx`.
    ///
    /// Each pass through the loop is one entry into the router: check the
    /// attempt ceiling, pick a peer, dispatch. A dispatch that exhausts its
    /// retries demotes the backend and comes back here with one more attempt.
    pub async fn route(
        &self,
        request: &ReplayableRequest,
        mut ctx: AttemptContext,
    ) -> Result<Response<Body>, RouteError> {
        loop {
            if self.policy.attempts_exhausted(ctx) {
                tracing::warn!(
                    request_id = %request.request_id(),
                    remote = ?request.client_addr(),
                    path = %request.path(),
                    attempts = ctx.attempts(),
                    "Max attempts reached, terminating"
                );
                return Err(RouteError::AttemptsExhausted {
                    attempts: ctx.attempts(),
                });
            }

            let Some(peer) = self.pool.get_next_peer() else {
                tracing::warn!(
                    request_id = %request.request_id(),
                    path = %request.path(),
                    backend_count = self.pool.len(),
                    "No live backend available"
                );
                return Err(RouteError::NoPeerAvailable);
            };

            match self.dispatch(&peer, request, ctx).await {
                Ok(response) => return Ok(response),
                Err(next) => {
                    self.pool.mark_backend_status(peer.address(), false);
                    metrics::record_failover(peer.address());
                    tracing::warn!(
                        request_id = %request.request_id(),
                        remote = ?request.client_addr(),
                        path = %request.path(),
                        backend = %peer,
                        attempt = next.attempts(),
                        "Backend marked dead, attempting another peer"
                    );
                    ctx = next;
                }
            }
        }
    }

    /// Forward to one backend, retrying it until the policy says to fail over.
    /// On failover, returns the context to re-enter the router with.
    async fn dispatch(
        &self,
        backend: &Backend,
        request: &ReplayableRequest,
        mut ctx: AttemptContext,
    ) -> Result<Response<Body>, AttemptContext> {
        loop {
            let error: ForwardError = match self.forwarder.forward(backend, request).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };
            tracing::warn!(
                request_id = %request.request_id(),
                backend = %backend,
                retry = ctx.retries(),
                error = %error,
                "Forwarding failed"
            );

            match self.policy.on_failure(ctx) {
                FailureAction::RetrySame { delay, next } => {
                    metrics::record_retry(backend.address());
                    tokio::time::sleep(delay).await;
                    ctx = next;
                }
                FailureAction::Failover { next } => return Err(next),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{Request, StatusCode};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::time::{Duration, Instant};
    use url::Url;

    /// Records every forward call; fails for the configured addresses.
    #[derive(Default)]
    struct MockForwarder {
        failing: HashSet<String>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl MockForwarder {
        fn failing(addrs: &[&str]) -> Self {
            Self {
                failing: addrs.iter().map(|a| a.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls_to(&self, addr: &str) -> Vec<Instant> {
            self.calls
                .lock()
                .iter()
                .filter(|(a, _)| a == addr)
                .map(|(_, t)| *t)
                .collect()
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().len()
        }
    }

    impl Forwarder for MockForwarder {
        async fn forward(
            &self,
            backend: &Backend,
            _request: &ReplayableRequest,
        ) -> Result<Response<Body>, ForwardError> {
            self.calls
                .lock()
                .push((backend.address().to_string(), Instant::now()));
            if self.failing.contains(backend.address()) {
                Err(ForwardError::Timeout(Duration::from_millis(1)))
            } else {
                Ok(Response::new(Body::from(backend.address().to_string())))
            }
        }
    }

    const A: &str = "http://127.0.0.1:3031/";
    const B: &str = "http://127.0.0.1:3032/";
    const C: &str = "http://127.0.0.1:3033/";

    fn pool() -> Arc<ServerPool> {
        let backends = [A, B, C]
            .iter()
            .map(|a| Arc::new(Backend::new(Url::parse(a).unwrap())))
            .collect();
        Arc::new(ServerPool::new(backends).unwrap())
    }

    fn request() -> ReplayableRequest {
        let req = Request::builder()
            .uri("/hello")
            .body(Bytes::new())
            .unwrap();
        ReplayableRequest::from_parts(req, None)
    }

    async fn body_of(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_routes_round_robin() {
        let router = RequestRouter::new(pool(), MockForwarder::default(), RetryPolicy::default());
        let mut seen = Vec::new();
        for _ in 0..4 {
            let response = router.route(&request(), AttemptContext::new()).await.unwrap();
            seen.push(body_of(response).await);
        }
        assert_eq!(seen, vec![B, C, A, B]);
    }

    #[tokio::test]
    async fn test_exhausted_context_rejected_without_pool() {
        let pool = pool();
        let router = RequestRouter::new(pool.clone(), MockForwarder::default(), RetryPolicy::default());

        let err = router
            .route(&request(), AttemptContext::with_attempts(4))
            .await
            .unwrap_err();

        assert_eq!(err, RouteError::AttemptsExhausted { attempts: 4 });
        assert_eq!(pool.cursor(), 0, "pool must not be consulted");
        assert_eq!(router.forwarder.total_calls(), 0);
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_all_dead_rejected_without_forwarding() {
        let pool = pool();
        for b in pool.backends() {
            b.set_alive(false);
        }
        let router = RequestRouter::new(pool, MockForwarder::default(), RetryPolicy::default());

        let err = router.route(&request(), AttemptContext::new()).await.unwrap_err();
        assert_eq!(err, RouteError::NoPeerAvailable);
        assert_eq!(router.forwarder.total_calls(), 0);
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_failing_backend_retried_then_demoted() {
        let pool = pool();
        let router = RequestRouter::new(pool.clone(), MockForwarder::failing(&[B]), RetryPolicy::default());

        // cursor 0 -> B is chosen first
        let response = router.route(&request(), AttemptContext::new()).await.unwrap();
        assert_eq!(body_of(response).await, C);

        let b_calls = router.forwarder.calls_to(B);
        assert_eq!(b_calls.len(), 4, "initial dispatch plus three retries");
        for pair in b_calls.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(10));
        }
        assert!(!pool.backends()[1].is_alive());
        assert!(pool.backends()[0].is_alive());
        assert!(pool.backends()[2].is_alive());
    }

    #[tokio::test]
    async fn test_every_backend_failing_ends_in_no_peer() {
        let pool = pool();
        let router = RequestRouter::new(pool.clone(), MockForwarder::failing(&[A, B, C]), RetryPolicy::default());

        let err = router.route(&request(), AttemptContext::new()).await.unwrap_err();
        assert_eq!(err, RouteError::NoPeerAvailable);
        assert_eq!(router.forwarder.total_calls(), 12);
        assert!(pool.backends().iter().all(|b| !b.is_alive()));
    }

    #[tokio::test]
    async fn test_attempt_ceiling_bounds_failovers() {
        let backends = (0..6)
            .map(|i| Arc::new(Backend::new(Url::parse(&format!("http://127.0.0.1:{}", 4000 + i)).unwrap())))
            .collect();
        let pool = Arc::new(ServerPool::new(backends).unwrap());
        let failing: Vec<String> = pool.backends().iter().map(|b| b.address().to_string()).collect();
        let failing: Vec<&str> = failing.iter().map(String::as_str).collect();
        let router = RequestRouter::new(pool.clone(), MockForwarder::failing(&failing), RetryPolicy::default());

        let err = router.route(&request(), AttemptContext::new()).await.unwrap_err();
        assert_eq!(err, RouteError::AttemptsExhausted { attempts: 4 });
        // attempts 0..=3 each cost four dispatches
        assert_eq!(router.forwarder.total_calls(), 16);
        assert_eq!(pool.backends().iter().filter(|b| b.is_alive()).count(), 2);
    }
}
