//! Security header middleware.
//! Applies the current `HeaderPolicy` to every response.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::security::HeaderPolicy;

/// Policy handle shared between the middleware and the reload task.
pub type SharedPolicy = Arc<ArcSwap<HeaderPolicy>>;

pub async fn security_headers_middleware(
    State(policy): State<SharedPolicy>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Snapshot at arrival so a reload mid-request cannot mix policies
    let policy = policy.load_full();
    let path = request.uri().path().to_string();
    let request_id = request.request_id().to_string();

    let mut response = next.run(request).await;
    let decision = policy.apply(&path, response.headers_mut());

    tracing::debug!(
        request_id = %request_id,
        path = %path,
        decision = decision.map_or("filtered", |d| d.as_str()),
        "Security header policy applied"
    );
    metrics::record_security_decision(decision);

    response
}
