//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//! - Validate path prefixes, header names/values and source patterns
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::routing::{PatternError, SourcePattern};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.url: {0}")]
    InvalidUpstream(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field}: path prefix {value:?} must start with '/'")]
    InvalidPrefix { field: &'static str, value: String },

    #[error("middleware.filter.deny_extensions: invalid extension {0:?}")]
    InvalidExtension(String),

    #[error("security.header_rules[{index}]: {source}")]
    InvalidPattern {
        index: usize,
        #[source]
        source: PatternError,
    },

    #[error("security.header_rules[{index}]: invalid header name {name:?}")]
    InvalidHeaderName { index: usize, name: String },

    #[error("security.header_rules[{index}]: invalid value for header {name:?}")]
    InvalidHeaderValue { index: usize, name: String },

    #[error("observability.log_level: unknown level {0:?}")]
    InvalidLogLevel(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero("listener.max_connections"));
    }

    if let Err(msg) = validate_upstream(&config.upstream.url) {
        errors.push(ValidationError::InvalidUpstream(msg));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.connect_timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    check_prefix(&mut errors, "middleware.internal_prefix", &config.middleware.internal_prefix);
    check_prefix(&mut errors, "middleware.static_prefix", &config.middleware.static_prefix);
    for prefix in &config.middleware.filter.deny_prefixes {
        check_prefix(&mut errors, "middleware.filter.deny_prefixes", prefix);
    }
    for ext in &config.middleware.filter.deny_extensions {
        if ext.is_empty() || ext.contains(['.', '/']) {
            errors.push(ValidationError::InvalidExtension(ext.clone()));
        }
    }

    for (index, rule) in config.security.header_rules.iter().enumerate() {
        if let Err(source) = SourcePattern::parse(&rule.source) {
            errors.push(ValidationError::InvalidPattern { index, source });
        }
        for pair in &rule.headers {
            if HeaderName::from_bytes(pair.key.as_bytes()).is_err() {
                errors.push(ValidationError::InvalidHeaderName {
                    index,
                    name: pair.key.clone(),
                });
            } else if HeaderValue::from_str(&pair.value).is_err() {
                errors.push(ValidationError::InvalidHeaderValue {
                    index,
                    name: pair.key.clone(),
                });
            }
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("{raw:?}: {e}"))?;
    if url.scheme() != "http" {
        return Err(format!("{raw:?}: only http upstreams are supported"));
    }
    if url.host_str().is_none() {
        return Err(format!("{raw:?}: missing host"));
    }
    Ok(())
}

fn check_prefix(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::InvalidPrefix {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{HeaderPairConfig, HeaderRuleConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nope".into();
        config.listener.max_connections = 0;
        config.upstream.url = "https://app.internal".into();
        config.middleware.static_prefix = "".into();
        config.middleware.filter.deny_extensions.push(".png".into());
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::Zero("listener.max_connections")));
        assert!(errors.contains(&ValidationError::InvalidExtension(".png".into())));
    }

    #[test]
    fn test_header_rule_errors() {
        let mut config = GatewayConfig::default();
        config.security.header_rules.push(HeaderRuleConfig {
            source: "/:path*/x".into(),
            headers: vec![
                HeaderPairConfig { key: "Bad Name".into(), value: "v".into() },
                HeaderPairConfig { key: "X-Ok".into(), value: "line\nbreak".into() },
            ],
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidPattern {
                    index: 0,
                    source: PatternError::RepeatNotLast("/:path*/x".into()),
                },
                ValidationError::InvalidHeaderName { index: 0, name: "Bad Name".into() },
                ValidationError::InvalidHeaderValue { index: 0, name: "X-Ok".into() },
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
