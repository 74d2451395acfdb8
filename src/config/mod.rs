//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into HeaderPolicy, shared via ArcSwap
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps in a freshly compiled HeaderPolicy
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Listener and upstream changes only take effect on restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    FilterConfig, GatewayConfig, HeaderPairConfig, HeaderRuleConfig, ListenerConfig,
    MiddlewareConfig, ObservabilityConfig, ResponseConfig, SecurityConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
