//! Path matching for the middleware applicability filter.
//!
//! # Responsibilities
//! - Match path prefixes (case-sensitive)
//! - Match file extensions of the last path segment (case-sensitive)
//! - Combine deny conditions with OR semantics
//!
//! # Design Decisions
//! - Literal allow/deny table instead of a regex with lookahead
//! - Empty deny table = every path is included
//! - No regex to guarantee O(n) matching
//!
//! The table reads the framework matcher
//! `/((?!_next/static|_next/image|favicon.ico|.*\.(?:svg|png|jpg|jpeg|gif|webp|ico)$).*)`
//! literally. In that regex the `.` of `favicon.ico` is a wildcard, so it also
//! excludes paths such as `/faviconXico`; here only the exact `/favicon.ico`
//! prefix is denied.

use axum::body::Body;
use axum::http::Request;

use crate::config::FilterConfig;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches_path(&self, path: &str) -> bool;

    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matches_path(req.uri().path())
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches_path(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches paths ending in `.<ext>` for one of a set of extensions.
#[derive(Debug, Clone)]
pub struct ExtensionMatcher {
    extensions: Vec<String>,
}

impl ExtensionMatcher {
    /// Extensions are given without the leading dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }
}

impl Matcher for ExtensionMatcher {
    fn matches_path(&self, path: &str) -> bool {
        let segment = path.rsplit('/').next().unwrap_or(path);
        match segment.rsplit_once('.') {
            Some((_, ext)) => self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug, Default)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Matcher for AnyMatcher {
    fn matches_path(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches_path(path))
    }
}

/// Decides which paths invoke the security header middleware at all.
///
/// Prefixes are compared as literal strings, never as patterns.
#[derive(Debug, Default)]
pub struct PathFilter {
    deny: AnyMatcher,
}

impl PathFilter {
    /// Compile the filter table from configuration.
    pub fn from_config(config: &FilterConfig) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = config
            .deny_prefixes
            .iter()
            .map(|p| Box::new(PathPrefixMatcher::new(p.clone())) as Box<dyn Matcher>)
            .collect();

        if !config.deny_extensions.is_empty() {
            matchers.push(Box::new(ExtensionMatcher::new(config.deny_extensions.iter().cloned())));
        }

        Self {
            deny: AnyMatcher::new(matchers),
        }
    }

    /// Returns true if the middleware should run for this path.
    pub fn includes(&self, path: &str) -> bool {
        !self.deny.matches_path(path)
    }
}
