//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::security::headers::{DEFAULT_INTERNAL_PREFIX, DEFAULT_STATIC_PREFIX};

/// Root configuration for the header gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, backpressure).
    pub listener: ListenerConfig,

    /// The application all requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security header middleware settings.
    pub middleware: MiddlewareConfig,

    /// Static header rules and upstream header hygiene.
    pub security: SecurityConfig,

    /// Response encoding.
    pub response: ResponseConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the application (e.g., "http://127.0.0.1:3000").
    pub url: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security header middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MiddlewareConfig {
    /// Run the middleware at all.
    pub enabled: bool,

    /// Prefix of framework-internal assets (skipped).
    pub internal_prefix: String,

    /// Prefix of static assets (skipped).
    pub static_prefix: String,

    /// Which paths invoke the middleware.
    pub filter: FilterConfig,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            internal_prefix: DEFAULT_INTERNAL_PREFIX.to_string(),
            static_prefix: DEFAULT_STATIC_PREFIX.to_string(),
            filter: FilterConfig::default(),
        }
    }
}

/// Deny table for the middleware applicability filter.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Paths starting with any of these never reach the middleware.
    /// Compared literally: `/favicon.ico` does not match `/faviconXico`.
    pub deny_prefixes: Vec<String>,

    /// File extensions (without dot) that never reach the middleware.
    pub deny_extensions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            deny_prefixes: ["/_next/static", "/_next/image", "/favicon.ico"]
                .into_iter()
                .map(String::from)
                .collect(),
            deny_extensions: ["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Keep `X-Powered-By` on upstream responses.
    pub powered_by_header: bool,

    /// Headers applied to every response whose path matches `source`.
    pub header_rules: Vec<HeaderRuleConfig>,
}

/// A static header rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HeaderRuleConfig {
    /// Source path pattern (e.g., "/:path*").
    pub source: String,

    /// Headers to set.
    pub headers: Vec<HeaderPairConfig>,
}

/// A single header key/value pair.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HeaderPairConfig {
    pub key: String,
    pub value: String,
}

/// Response encoding configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResponseConfig {
    /// Compress responses (gzip/brotli) for clients that accept it.
    pub compress: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self { compress: true }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert!(config.middleware.enabled);
        assert!(!config.security.powered_by_header);
        assert!(config.security.header_rules.is_empty());
        assert!(config.response.compress);
    }

    #[test]
    fn test_header_rules_parse() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            url = "http://app:3000"

            [[security.header_rules]]
            source = "/:path*"
            headers = [
                { key = "X-DNS-Prefetch-Control", value = "on" },
                { key = "Permissions-Policy", value = "camera=(), microphone=(), geolocation=()" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.url, "http://app:3000");
        assert_eq!(config.upstream.connect_timeout_secs, 5);
        assert_eq!(config.security.header_rules.len(), 1);
        assert_eq!(config.security.header_rules[0].headers[1].key, "Permissions-Policy");
    }
}
