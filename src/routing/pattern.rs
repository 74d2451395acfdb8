//! Source path patterns for static header rules.
//!
//! Supported syntax, one item per `/`-separated segment:
//! - `literal` matches exactly
//! - `:name` matches exactly one non-empty segment
//! - `:name*` (last only) matches zero or more remaining segments
//! - `:name+` (last only) matches one or more remaining segments

use std::str::FromStr;

use thiserror::Error;

/// Errors produced when compiling a source pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    #[error("empty parameter name in pattern {0:?}")]
    EmptyParameter(String),

    #[error("repeating parameter must be the last segment in pattern {0:?}")]
    RepeatNotLast(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    ZeroOrMore,
    OneOrMore,
}

/// A compiled source pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl SourcePattern {
    /// Compile a pattern such as `/:path*` or `/blog/:slug`.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(raw.to_string()))?;

        let parts: Vec<&str> = split_segments(rest).collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (i, part) in parts.iter().enumerate() {
            let segment = match part.strip_prefix(':') {
                None => Segment::Literal((*part).to_string()),
                Some(param) => {
                    let (name, segment) = if let Some(name) = param.strip_suffix('*') {
                        (name, Segment::ZeroOrMore)
                    } else if let Some(name) = param.strip_suffix('+') {
                        (name, Segment::OneOrMore)
                    } else {
                        (param, Segment::Param)
                    };
                    if name.is_empty() {
                        return Err(PatternError::EmptyParameter(raw.to_string()));
                    }
                    if segment != Segment::Param && i + 1 != parts.len() {
                        return Err(PatternError::RepeatNotLast(raw.to_string()));
                    }
                    segment
                }
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if the request path matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let rest = path.strip_prefix('/').unwrap_or(path);
        let parts: Vec<&str> = split_segments(rest).collect();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::ZeroOrMore => return true,
                Segment::OneOrMore => return parts.len() > i,
                Segment::Param => {
                    if parts.get(i).map_or(true, |p| p.is_empty()) {
                        return false;
                    }
                }
                Segment::Literal(lit) => {
                    if parts.get(i) != Some(&lit.as_str()) {
                        return false;
                    }
                }
            }
        }

        parts.len() == self.segments.len()
    }
}

impl FromStr for SourcePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split on `/`, ignoring a single trailing slash; `""` yields no segments.
fn split_segments(rest: &str) -> impl Iterator<Item = &str> {
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    rest.split('/').filter(move |_| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_all() {
        let pattern: SourcePattern = "/:path*".parse().unwrap();
        assert!(pattern.matches("/"));
        assert!(pattern.matches(""));
        assert!(pattern.matches("/a"));
        assert!(pattern.matches("/a/b/c.js"));
    }

    #[test]
    fn test_one_or_more() {
        let pattern = SourcePattern::parse("/docs/:rest+").unwrap();
        assert!(!pattern.matches("/docs"));
        assert!(pattern.matches("/docs/intro"));
        assert!(pattern.matches("/docs/a/b"));
    }

    #[test]
    fn test_single_param() {
        let pattern = SourcePattern::parse("/blog/:slug").unwrap();
        assert!(pattern.matches("/blog/hello"));
        assert!(pattern.matches("/blog/hello/"));
        assert!(!pattern.matches("/blog"));
        assert!(!pattern.matches("/blog/"));
        assert!(!pattern.matches("/blog/hello/world"));
        assert!(!pattern.matches("/news/hello"));
    }

    #[test]
    fn test_literal() {
        let pattern = SourcePattern::parse("/").unwrap();
        assert!(pattern.matches("/"));
        assert!(!pattern.matches("/a"));

        let pattern = SourcePattern::parse("/api/health").unwrap();
        assert!(pattern.matches("/api/health"));
        assert!(!pattern.matches("/api/Health"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(
            SourcePattern::parse("path"),
            Err(PatternError::MissingLeadingSlash("path".into()))
        );
        assert_eq!(
            SourcePattern::parse("/:*"),
            Err(PatternError::EmptyParameter("/:*".into()))
        );
        assert_eq!(
            SourcePattern::parse("/:path*/edit"),
            Err(PatternError::RepeatNotLast("/:path*/edit".into()))
        );
    }
}
