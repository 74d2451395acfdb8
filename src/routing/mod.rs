//! Path routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → matcher.rs (applicability filter: does the middleware run?)
//!     → pattern.rs (which static header rules apply?)
//!
//! Compilation (at startup and on reload):
//!     FilterConfig / HeaderRuleConfig[]
//!     → Compile matchers and source patterns
//!     → Freeze inside an immutable HeaderPolicy
//! ```
//!
//! # Design Decisions
//! - Tables compiled once, immutable at runtime
//! - No regex in hot path (prefix/suffix/segment matching only)
//! - Deterministic: same input always yields the same decision

pub mod matcher;
pub mod pattern;

pub use matcher::{Matcher, PathFilter};
pub use pattern::{PatternError, SourcePattern};
