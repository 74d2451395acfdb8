//! Response handling and transformation.
//!
//! # Responsibilities
//! - Convert the upstream response for the client
//! - Strip hop-by-hop headers
//! - Map upstream failures to HTTP status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Upstream connection failures result in 502 Bad Gateway

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;

use crate::http::request::strip_hop_by_hop;

/// Turn an upstream response into a client response without buffering.
pub fn from_upstream(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// Response sent when the upstream cannot be reached.
pub fn bad_gateway() -> Response<Body> {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}

/// Response sent when the inbound URI cannot be mapped onto the upstream.
pub fn bad_request() -> Response<Body> {
    (StatusCode::BAD_REQUEST, "Invalid request URI").into_response()
}
