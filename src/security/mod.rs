//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream response for path P:
//!     → policy.rs (strip X-Powered-By, static header rules for P)
//!     → routing::matcher (is P in the middleware's applicability filter?)
//!     → headers.rs (P an asset? skip : inject security headers)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Decision rule is pure and total over all paths
//! - Headers overwrite, never duplicate
//! - Policy compiled once per config, swapped atomically on reload

pub mod headers;
pub mod policy;

pub use headers::{apply_security_headers, AssetSkipRule, PathDecision, SECURITY_HEADERS};
pub use policy::{HeaderPolicy, PolicyError};
