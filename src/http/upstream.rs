//! Upstream application target.
//!
//! # Responsibilities
//! - Hold the pre-parsed upstream base URL
//! - Rewrite inbound request URIs to point at the upstream
//! - Own the pooled hyper client used for forwarding

use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid request uri: {0}")]
    Uri(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),
}

/// The single application all traffic is forwarded to.
#[derive(Debug, Clone)]
pub struct Upstream {
    /// Pre-parsed base URL, for logging.
    pub base_url: Url,
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    client: Client<HttpConnector, Body>,
}

impl Upstream {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let invalid = |reason: String| UpstreamError::InvalidUrl {
            url: config.url.clone(),
            reason,
        };

        let base_url = Url::parse(&config.url).map_err(|e| invalid(e.to_string()))?;
        let scheme: Scheme = base_url
            .scheme()
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| invalid(e.to_string()))?;

        let host = base_url
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;
        let authority = match base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority: Authority = authority.parse().map_err(|e: axum::http::uri::InvalidUri| invalid(e.to_string()))?;

        let base_path = base_url.path().trim_end_matches('/').to_string();

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            base_url,
            scheme,
            authority,
            base_path,
            client,
        })
    }

    /// Map an inbound URI onto the upstream, keeping path and query.
    pub fn rewrite(&self, uri: &Uri) -> Result<Uri, UpstreamError> {
        let path_and_query = uri.path_and_query().map_or("/", PathAndQuery::as_str);
        let target = format!("{}{}", self.base_path, path_and_query);

        Ok(Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(target)
            .build()?)
    }

    /// Forward a prepared request.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Incoming>, UpstreamError> {
        Ok(self.client.request(request).await?)
    }
}
