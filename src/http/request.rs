//! Request handling and transformation.
//!
//! # Responsibilities
//! - Buffer the inbound request once so it can be re-dispatched
//! - Build the upstream request for a chosen backend
//! - Strip hop-by-hop headers and append `X-Forwarded-For`
//!
//! # Design Decisions
//! - Body size bounded before anything is forwarded
//! - The inbound `Host` header is preserved

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, Version};
use http_body_util::LengthLimitError;
use thiserror::Error;

use crate::load_balancer::Backend;

/// Header carrying the request ID set by the HTTP layer.
pub const X_REQUEST_ID: &str = "x-request-id";

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers meaningful only for a single transport hop.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(axum::Error),
}

/// An inbound request with its body held in memory.
#[derive(Debug, Clone)]
pub struct ReplayableRequest {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    client_addr: Option<SocketAddr>,
}

impl ReplayableRequest {
    /// Read the whole body, up to `limit` bytes.
    pub async fn buffer(
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
        limit: usize,
    ) -> Result<Self, BodyError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit).await.map_err(|e| {
            let inner = e.into_inner();
            if inner.downcast_ref::<LengthLimitError>().is_some() {
                BodyError::TooLarge { limit }
            } else {
                BodyError::Read(axum::Error::new(inner))
            }
        })?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            client_addr,
        })
    }

    /// Build from already-buffered parts.
    pub fn from_parts(request: Request<Bytes>, client_addr: Option<SocketAddr>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            client_addr,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn client_addr(&self) -> Option<SocketAddr> {
        self.client_addr
    }

    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }

    /// Construct a fresh upstream request addressed at `backend`.
    pub fn to_upstream(&self, backend: &Backend) -> Result<Request<Body>, axum::http::Error> {
        let path_and_query = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri = backend.upstream_uri(path_and_query)?;

        let mut headers = self.headers.clone();
        strip_hop_by_hop(&mut headers);

        if let Some(client) = self.client_addr {
            let client_ip = client.ip().to_string();
            let forwarded = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
                Some(prior) => format!("{}, {}", prior, client_ip),
                None => client_ip,
            };
            headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(&forwarded)?);
        }

        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(uri)
            .version(upstream_version(self.version))
            .body(Body::from(self.body.clone()))?;
        *request.headers_mut() = headers;
        Ok(request)
    }
}

/// The upstream client speaks HTTP/1.1 unless HTTP/2 is negotiated on its own.
fn upstream_version(inbound: Version) -> Version {
    match inbound {
        Version::HTTP_09 | Version::HTTP_10 | Version::HTTP_2 | Version::HTTP_3 => Version::HTTP_11,
        other => other,
    }
}
