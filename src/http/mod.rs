//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, forwarded headers)
//!     → middleware/security_headers.rs (policy snapshot)
//!     → upstream.rs (URI rewrite, forward)
//!     → response.rs (transform, error mapping)
//!     → middleware/security_headers.rs (apply policy to response)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
pub use upstream::Upstream;
