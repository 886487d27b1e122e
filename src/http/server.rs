//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Spawn the health monitor next to the server
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{HealthCheckConfig, ProxyConfig};
use crate::health::HealthMonitor;
use crate::http::forward::HyperForwarder;
use crate::http::request::{BodyError, ReplayableRequest};
use crate::http::response::plain_text;
use crate::load_balancer::ServerPool;
use crate::observability::metrics;
use crate::resilience::{RetryPolicy, UpstreamTimeouts};
use crate::routing::{AttemptContext, RequestRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RequestRouter<HyperForwarder>>,
    pub max_body_bytes: usize,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    pool: Arc<ServerPool>,
    health_check: HealthCheckConfig,
}

impl HttpServer {
    /// Create a new HTTP server over an already-built pool.
    pub fn new(config: &ProxyConfig, pool: Arc<ServerPool>) -> Self {
        let forwarder = HyperForwarder::new(UpstreamTimeouts::from_config(&config.timeouts));
        let policy = RetryPolicy::from_config(&config.retries);

        let state = AppState {
            router: Arc::new(RequestRouter::new(pool.clone(), forwarder, policy)),
            max_body_bytes: config.listener.max_body_bytes,
        };

        Self {
            router: Self::build_router(state),
            pool,
            health_check: config.health_check.clone(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The pool this server routes over.
    pub fn pool(&self) -> &Arc<ServerPool> {
        &self.pool
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, backends = self.pool.len(), "Load balancer started");

        if self.health_check.enabled {
            let monitor = HealthMonitor::new(self.pool.clone(), self.health_check.clone());
            tokio::spawn(monitor.run(shutdown.resubscribe()));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: buffer the request, then hand it to the router.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();

    let request = match ReplayableRequest::buffer(request, Some(client), state.max_body_bytes).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(remote = %client, error = %e, "Rejected request body");
            metrics::record_request("rejected", start);
            return match e {
                BodyError::TooLarge { .. } => {
                    plain_text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                }
                BodyError::Read(_) => plain_text(StatusCode::BAD_REQUEST, "Unreadable request body"),
            };
        }
    };

    tracing::debug!(
        request_id = %request.request_id(),
        method = %request.method(),
        path = %request.path(),
        "Routing request"
    );

    match state.router.route(&request, AttemptContext::new()).await {
        Ok(response) => {
            metrics::record_request("proxied", start);
            response
        }
        Err(e) => {
            metrics::record_request(e.outcome(), start);
            e.into_response()
        }
    }
}
