//! Compiled header policy.
//!
//! A `HeaderPolicy` is the immutable, runtime form of the `middleware` and
//! `security` configuration sections. The server keeps the current policy in
//! an `ArcSwap` and replaces it wholesale on reload.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::routing::{PathFilter, PatternError, SourcePattern};
use crate::security::headers::{
    apply_headers, apply_security_headers, strip_powered_by, AssetSkipRule, PathDecision,
};

/// Errors raised while compiling a policy from unvalidated configuration.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("invalid header name {0:?}")]
    HeaderName(String),

    #[error("invalid value for header {0:?}")]
    HeaderValue(String),
}

#[derive(Debug)]
struct HeaderRule {
    pattern: SourcePattern,
    headers: Vec<(HeaderName, HeaderValue)>,
}

#[derive(Debug)]
pub struct HeaderPolicy {
    middleware_enabled: bool,
    skip_rule: AssetSkipRule,
    filter: PathFilter,
    rules: Vec<HeaderRule>,
    keep_powered_by: bool,
}

impl HeaderPolicy {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, PolicyError> {
        let mut rules = Vec::with_capacity(config.security.header_rules.len());
        for rule in &config.security.header_rules {
            let pattern = SourcePattern::parse(&rule.source)?;
            let headers = rule
                .headers
                .iter()
                .map(|pair| {
                    let name = HeaderName::from_bytes(pair.key.as_bytes())
                        .map_err(|_| PolicyError::HeaderName(pair.key.clone()))?;
                    let value = HeaderValue::from_str(&pair.value)
                        .map_err(|_| PolicyError::HeaderValue(pair.key.clone()))?;
                    Ok((name, value))
                })
                .collect::<Result<Vec<_>, PolicyError>>()?;
            rules.push(HeaderRule { pattern, headers });
        }

        Ok(Self {
            middleware_enabled: config.middleware.enabled,
            skip_rule: AssetSkipRule::new(
                config.middleware.internal_prefix.clone(),
                config.middleware.static_prefix.clone(),
            ),
            filter: PathFilter::from_config(&config.middleware.filter),
            rules,
            keep_powered_by: config.security.powered_by_header,
        })
    }

    /// Run the middleware decision for a path.
    ///
    /// `None` means the middleware is not invoked for this path at all.
    pub fn decide(&self, path: &str) -> Option<PathDecision> {
        if self.middleware_enabled && self.filter.includes(path) {
            Some(self.skip_rule.decide(path))
        } else {
            None
        }
    }

    /// Static rule headers matching this path, in rule order.
    pub fn static_headers<'a>(
        &'a self,
        path: &'a str,
    ) -> impl Iterator<Item = &'a (HeaderName, HeaderValue)> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.pattern.matches(path))
            .flat_map(|rule| rule.headers.iter())
    }

    /// Apply the whole policy to an outgoing response's headers.
    ///
    /// Static rules go first so the middleware's own values win on conflict.
    pub fn apply(&self, path: &str, headers: &mut HeaderMap) -> Option<PathDecision> {
        if !self.keep_powered_by {
            strip_powered_by(headers);
        }

        apply_headers(headers, self.static_headers(path));

        let decision = self.decide(path);
        if decision == Some(PathDecision::Inject) {
            apply_security_headers(headers);
        }
        decision
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self {
            middleware_enabled: true,
            skip_rule: AssetSkipRule::default(),
            filter: PathFilter::from_config(&Default::default()),
            rules: Vec::new(),
            keep_powered_by: false,
        }
    }
}
