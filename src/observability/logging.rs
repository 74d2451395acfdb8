//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from environment or config
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over `observability.log_level`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(log_level: &str) -> String {
    let level = log_level.to_lowercase();
    format!("header_gateway={level},tower_http={level}")
}

/// Install the global tracing subscriber.
///
/// Returns false if a subscriber was already installed.
pub fn init_logging(log_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
