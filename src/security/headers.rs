//! Security response headers.
//!
//! # Responsibilities
//! - Decide whether a request path receives security headers
//! - Insert the fixed security header set into a response
//! - Strip `X-Powered-By` from upstream responses
//!
//! # Design Decisions
//! - Decision is a pure function of the path (no request state)
//! - Headers are inserted, never appended: applying twice is a no-op
//! - Any path containing `.` is treated as a static file

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};

/// Default prefix of framework-internal assets.
pub const DEFAULT_INTERNAL_PREFIX: &str = "/_next";

/// Default prefix of static assets.
pub const DEFAULT_STATIC_PREFIX: &str = "/static";

/// Header advertising the upstream framework.
pub const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// The header set injected on every non-asset response.
pub const SECURITY_HEADERS: [(HeaderName, &str); 3] = [
    (X_FRAME_OPTIONS, "SAMEORIGIN"),
    (X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (REFERRER_POLICY, "strict-origin-when-cross-origin"),
];

/// Outcome of the decision rule for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDecision {
    /// Forward unchanged.
    Skip,
    /// Attach [`SECURITY_HEADERS`].
    Inject,
}

impl PathDecision {
    /// Label used for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PathDecision::Skip => "skip",
            PathDecision::Inject => "inject",
        }
    }
}

/// Skip rule for static and framework-internal assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSkipRule {
    internal_prefix: String,
    static_prefix: String,
}

impl AssetSkipRule {
    pub fn new(internal_prefix: impl Into<String>, static_prefix: impl Into<String>) -> Self {
        Self {
            internal_prefix: internal_prefix.into(),
            static_prefix: static_prefix.into(),
        }
    }

    /// Apply the decision rule to a request path.
    ///
    /// Total over all strings: the empty path is not an asset and gets headers.
    pub fn decide(&self, path: &str) -> PathDecision {
        if path.starts_with(&self.internal_prefix)
            || path.starts_with(&self.static_prefix)
            || path.contains('.')
        {
            PathDecision::Skip
        } else {
            PathDecision::Inject
        }
    }
}

impl Default for AssetSkipRule {
    fn default() -> Self {
        Self::new(DEFAULT_INTERNAL_PREFIX, DEFAULT_STATIC_PREFIX)
    }
}

/// Insert the security header set, overwriting any existing values.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Insert arbitrary header pairs, overwriting any existing values.
pub fn apply_headers<'a, I>(headers: &mut HeaderMap, pairs: I)
where
    I: IntoIterator<Item = &'a (HeaderName, HeaderValue)>,
{
    for (name, value) in pairs {
        headers.insert(name.clone(), value.clone());
    }
}

/// Remove `X-Powered-By`. Returns true if a header was present.
pub fn strip_powered_by(headers: &mut HeaderMap) -> bool {
    headers.remove(X_POWERED_BY).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_paths_get_headers() {
        let rule = AssetSkipRule::default();
        assert_eq!(rule.decide("/dashboard"), PathDecision::Inject);
        assert_eq!(rule.decide("/api/users"), PathDecision::Inject);
        assert_eq!(rule.decide("/"), PathDecision::Inject);
    }

    #[test]
    fn test_asset_paths_are_skipped() {
        let rule = AssetSkipRule::default();
        assert_eq!(rule.decide("/_next/static/chunk.js"), PathDecision::Skip);
        assert_eq!(rule.decide("/_nextauth"), PathDecision::Skip); // prefix, not segment
        assert_eq!(rule.decide("/static/logo"), PathDecision::Skip);
        assert_eq!(rule.decide("/staticky"), PathDecision::Skip);
        assert_eq!(rule.decide("/favicon.ico"), PathDecision::Skip);
        assert_eq!(rule.decide("/users/john.doe"), PathDecision::Skip);
    }

    #[test]
    fn test_empty_path_gets_headers() {
        assert_eq!(AssetSkipRule::default().decide(""), PathDecision::Inject);
    }

    #[test]
    fn test_custom_prefixes() {
        let rule = AssetSkipRule::new("/assets", "/public");
        assert_eq!(rule.decide("/assets/app"), PathDecision::Skip);
        assert_eq!(rule.decide("/public/img"), PathDecision::Skip);
        assert_eq!(rule.decide("/_next/data"), PathDecision::Inject);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

        apply_security_headers(&mut headers);
        let once = headers.clone();
        apply_security_headers(&mut headers);

        assert_eq!(headers, once);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get_all("x-frame-options").iter().count(), 1);
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
    }

    #[test]
    fn test_strip_powered_by() {
        let mut headers = HeaderMap::new();
        headers.insert(X_POWERED_BY, HeaderValue::from_static("Next.js"));
        assert!(strip_powered_by(&mut headers));
        assert!(!strip_powered_by(&mut headers));
        assert!(headers.is_empty());
    }
}
