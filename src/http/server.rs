//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up middleware (tracing, request ID, security headers, limits)
//! - Forward requests to the upstream application
//! - Swap in new header policies on configuration reload
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Extensions, HeaderMap, Request, StatusCode, Version},
    middleware,
    response::Response,
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    compression::{predicate::{DefaultPredicate, Predicate}, CompressionLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::middleware::{security_headers_middleware, SharedPolicy};
use crate::http::request::{prepare_forward_headers, MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
use crate::http::response;
use crate::http::upstream::{Upstream, UpstreamError};
use crate::observability::metrics;
use crate::security::{HeaderPolicy, PolicyError};

/// Errors raised while constructing the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("header policy: {0}")]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<Upstream>,
}

/// HTTP server for the header gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    policy: SharedPolicy,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let policy: SharedPolicy = Arc::new(ArcSwap::from_pointee(HeaderPolicy::from_config(&config)?));
        let upstream = Arc::new(Upstream::from_config(&config.upstream)?);

        let router = Self::build_router(&config, AppState { upstream }, policy.clone());
        Ok(Self {
            router,
            config,
            policy,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `Router::layer` wraps each route separately, so the concurrency limit
    /// uses one shared semaphore across both routes.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, policy: SharedPolicy) -> Router {
        let compress = config.response.compress;
        let compression = CompressionLayer::new().compress_when(DefaultPredicate::new().and(
            move |_: StatusCode, _: Version, _: &HeaderMap, _: &Extensions| compress,
        ));

        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(middleware::from_fn_with_state(policy, security_headers_middleware))
            .layer(compression)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live header policy.
    pub fn policy(&self) -> SharedPolicy {
        self.policy.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Every config received on `config_updates` replaces the header policy.
    /// Returns once `shutdown` fires and in-flight requests have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.url,
            "HTTP server starting"
        );

        let policy = self.policy.clone();
        let mut current = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(next) = config_updates.recv().await {
                if apply_config_update(&policy, &current, &next) {
                    current = next;
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await;

        reloader.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Compile `next` and swap it in; on failure keep the current policy.
///
/// Returns true if the new policy is live.
pub fn apply_config_update(policy: &SharedPolicy, current: &GatewayConfig, next: &GatewayConfig) -> bool {
    match HeaderPolicy::from_config(next) {
        Ok(compiled) => {
            policy.store(Arc::new(compiled));
            metrics::record_config_reload(true);
            tracing::info!(
                middleware_enabled = next.middleware.enabled,
                header_rules = next.security.header_rules.len(),
                "Header policy reloaded"
            );
        }
        Err(e) => {
            metrics::record_config_reload(false);
            tracing::error!(error = %e, "Rejected header policy, keeping current");
            return false;
        }
    }

    if next.listener != current.listener
        || next.upstream != current.upstream
        || next.timeouts != current.timeouts
        || next.response != current.response
    {
        tracing::warn!("Listener, upstream, timeout and response changes take effect after restart");
    }
    true
}

/// Forward the request to the upstream application.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().to_string();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Forwarding request"
    );

    let (mut parts, body) = request.into_parts();
    parts.uri = match state.upstream.rewrite(&parts.uri) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Cannot map request onto upstream");
            metrics::record_request(&method, 400, start_time);
            return response::bad_request();
        }
    };
    prepare_forward_headers(&mut parts.headers, client);
    // The upstream client speaks HTTP/1 only; h2c clients are downgraded here
    parts.version = Version::HTTP_11;

    match state.upstream.send(Request::from_parts(parts, body)).await {
        Ok(upstream_response) => {
            metrics::record_request(&method, upstream_response.status().as_u16(), start_time);
            response::from_upstream(upstream_response)
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                upstream = %state.upstream.base_url,
                error = %e,
                "Upstream error"
            );
            metrics::record_upstream_error();
            metrics::record_request(&method, 502, start_time);
            response::bad_gateway()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeaderPairConfig, HeaderRuleConfig};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn unreachable_upstream() -> GatewayConfig {
        // Bind then release a port so nothing is listening on it
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut config = GatewayConfig::default();
        config.upstream.url = format!("http://127.0.0.1:{port}");
        config.upstream.connect_timeout_secs = 1;
        config
    }

    /// An upstream that accepts connections and never answers.
    async fn silent_upstream() -> GatewayConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut config = GatewayConfig::default();
        config.upstream.url = format!("http://{addr}");
        config.timeouts.request_secs = 1;
        config
    }

    async fn call(server: &HttpServer, path: &str) -> Response {
        server
            .router()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_bad_gateway_still_carries_security_headers() {
        let server = HttpServer::new(unreachable_upstream()).unwrap();

        let response = call(&server, "/dashboard").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
        assert!(response.headers().contains_key("x-request-id"));

        let response = call(&server, "/favicon.ico").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(!response.headers().contains_key("x-frame-options"));
    }

    #[tokio::test]
    async fn test_request_timeout_still_carries_security_headers() {
        let server = HttpServer::new(silent_upstream().await).unwrap();

        let response = call(&server, "/dashboard").await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["referrer-policy"], "strict-origin-when-cross-origin");
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_propagated() {
        let server = HttpServer::new(unreachable_upstream()).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[test]
    fn test_invalid_policy_rejected_on_reload() {
        let config = GatewayConfig::default();
        let policy: SharedPolicy = Arc::new(ArcSwap::from_pointee(HeaderPolicy::default()));

        let mut bad = config.clone();
        bad.security.header_rules.push(HeaderRuleConfig {
            source: "no-slash".into(),
            headers: vec![HeaderPairConfig { key: "X-A".into(), value: "1".into() }],
        });
        let before = Arc::as_ptr(&policy.load_full());
        assert!(!apply_config_update(&policy, &config, &bad));
        assert_eq!(Arc::as_ptr(&policy.load_full()), before);

        let mut good = config.clone();
        good.middleware.enabled = false;
        assert!(apply_config_update(&policy, &config, &good));
        assert_eq!(policy.load().decide("/dashboard"), None);
    }

    #[test]
    fn test_invalid_upstream_rejected() {
        let mut config = GatewayConfig::default();
        config.upstream.url = "::".into();
        assert!(matches!(HttpServer::new(config), Err(ServerError::Upstream(_))));
    }
}
