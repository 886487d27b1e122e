//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the backend response with hop-by-hop headers removed
//! - Produce the load balancer's own error responses
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Every terminal failure looks the same to the caller: a plain-text 503

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;

use crate::http::request::strip_hop_by_hop;

pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "Service not available";

/// Convert an upstream response into one we can hand back to the caller.
pub fn relay(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// The terminal failure response.
pub fn service_unavailable() -> Response<Body> {
    plain_text(StatusCode::SERVICE_UNAVAILABLE, SERVICE_UNAVAILABLE_MESSAGE)
}

/// A short plain-text response.
pub fn plain_text(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = (status, message).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
